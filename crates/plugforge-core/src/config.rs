//! Build configuration surface, abstracted from host property names.
//!
//! Every field is optional with a stated default; a missing config file is
//! equivalent to all-defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::error::{PlugforgeError, Result};
use crate::version::{GitVersionConfig, DEFAULT_ABBREV_HASH_LENGTH, DEFAULT_FORMAT_TEMPLATE};

fn default_version_format() -> String {
    DEFAULT_FORMAT_TEMPLATE.to_string()
}

fn default_abbrev_length() -> u32 {
    DEFAULT_ABBREV_HASH_LENGTH
}

fn default_version_file() -> PathBuf {
    PathBuf::from("generated/version/version.txt")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("generated/accmod")
}

fn default_checker_executable() -> PathBuf {
    PathBuf::from("access-checker")
}

/// Build-level configuration for version generation, manifest assembly, and
/// access-modifier verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Version format template for the git strategy. Default `%d.%s`.
    pub version_format: String,

    /// Prefix prepended to the formatted git version. Default empty.
    pub version_prefix: String,

    /// Abbreviated hash length for the git strategy. Default 12.
    pub abbrev_length: u32,

    /// Whether git version generation tolerates a dirty working tree.
    /// Default false.
    pub allow_dirty: bool,

    /// Where the two-line version record is persisted.
    /// Default `generated/version/version.txt` under the build's working area.
    pub version_file: PathBuf,

    /// Whether access violations fail the build. Default false.
    pub ignore_failures: bool,

    /// Fully qualified plugin base type for entry-class discovery. When
    /// unset, the entry-class producer contributes nothing.
    pub plugin_base_type: Option<String>,

    /// Executable implementing the isolated access check.
    /// Default `access-checker` (resolved via `PATH`).
    pub checker_executable: PathBuf,

    /// Directory receiving per-unit violation report artifacts.
    /// Default `generated/accmod`.
    pub report_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            version_format: default_version_format(),
            version_prefix: String::new(),
            abbrev_length: default_abbrev_length(),
            allow_dirty: false,
            version_file: default_version_file(),
            ignore_failures: false,
            plugin_base_type: None,
            checker_executable: default_checker_executable(),
            report_dir: default_report_dir(),
        }
    }
}

impl BuildConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            PlugforgeError::Configuration(format!(
                "failed to parse config {}: {e}",
                path.display()
            ))
        })
    }

    /// Git version config for the given repository root.
    pub fn git_version_config(&self, repository_root: &Path) -> GitVersionConfig {
        GitVersionConfig {
            format_template: self.version_format.clone(),
            prefix: self.version_prefix.clone(),
            abbrev_hash_length: self.abbrev_length,
            allow_dirty: self.allow_dirty,
            repository_root: repository_root.to_path_buf(),
        }
    }
}
