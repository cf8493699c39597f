//! The class metadata index.
//!
//! Instead of reflectively scanning compiled classes, the compile step emits
//! one `class-index.json` per output directory: a closed, explicitly-typed
//! registry of class names, concreteness, supertypes, and extension markers.
//! Producers scan this index.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::error::{PlugforgeError, Result};

/// File name of the per-directory metadata index.
pub const INDEX_FILE_NAME: &str = "class-index.json";

/// Declared dynamic-loading behavior of one extension point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DynamicLoadable {
    Yes,
    No,
    Maybe,
}

/// Marker denoting a class as an extension point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionMarker {
    /// Whether the extension tolerates dynamic (un)loading.
    pub dynamic_loadable: DynamicLoadable,
}

/// One class entry of the metadata index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassRecord {
    /// Fully qualified class name.
    pub name: String,

    /// Whether the class is concrete (not abstract, not an interface).
    #[serde(default)]
    pub concrete: bool,

    /// Fully qualified names of all supertypes, transitively.
    #[serde(default)]
    pub supertypes: Vec<String>,

    /// Extension marker, if the class is annotated as an extension point.
    #[serde(default)]
    pub extension: Option<ExtensionMarker>,
}

/// The aggregated metadata index over one or more compiled-output
/// directories. Read-only once compilation completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassIndex {
    /// Class records in index order.
    pub classes: Vec<ClassRecord>,
}

impl ClassIndex {
    /// Load the index of a single compiled-output directory.
    ///
    /// A directory without an index file contributes no classes; a malformed
    /// index is an analysis failure naming the offending file.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE_NAME);
        if !path.is_file() {
            debug!(dir = %dir.display(), "no class index present, treating as empty");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|e| {
            PlugforgeError::analysis(
                format!("malformed class index: {e}"),
                vec![path.display().to_string()],
            )
        })
    }

    /// Load and concatenate the indexes of several directories, preserving
    /// directory order.
    pub fn load_dirs(dirs: &[PathBuf]) -> Result<Self> {
        let mut merged = Self::default();
        for dir in dirs {
            let mut index = Self::load_dir(dir)?;
            merged.classes.append(&mut index.classes);
        }
        Ok(merged)
    }

    /// Concrete subtypes of the given base type, in index order.
    pub fn concrete_subtypes_of(&self, base_type: &str) -> Vec<&ClassRecord> {
        self.classes
            .iter()
            .filter(|c| c.concrete && c.supertypes.iter().any(|s| s == base_type))
            .collect()
    }

    /// All extension markers, in index order.
    pub fn extension_markers(&self) -> Vec<ExtensionMarker> {
        self.classes.iter().filter_map(|c| c.extension).collect()
    }
}
