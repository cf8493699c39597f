//! Single-point manifest assembly.
//!
//! The merger runs after every fragment producer has completed. It is the
//! only writer of the final manifest, which is built once per build
//! invocation and immutable afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use super::fragment::ManifestFragment;
use crate::domain::error::{PlugforgeError, Result};
use crate::domain::metadata::PluginMetadata;

/// Keys the final manifest must carry, in seed order.
pub const REQUIRED_KEYS: [&str; 6] = [
    "Plugin-Id",
    "Long-Name",
    "Plugin-Version",
    "Minimum-Java-Version",
    "Core-Version",
    "Minimum-Core-Version",
];

/// The merged, ordered key -> value manifest.
///
/// Insertion order is preserved so rendering is byte-for-byte deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalManifest {
    entries: Vec<(String, String)>,
}

impl FinalManifest {
    /// Empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key -> value pair.
    ///
    /// Re-inserting an existing key with the same value is idempotent, which
    /// lets a subset of producers re-run. A differing value is a conflict.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(existing) = self.get(key) {
            if existing == value {
                return Ok(());
            }
            return Err(PlugforgeError::ManifestConflict {
                key: key.to_string(),
                existing: existing.to_string(),
                incoming: value.to_string(),
            });
        }
        self.entries.push((key.to_string(), value.to_string()));
        Ok(())
    }

    /// Value for a key, if present. Keys are case-sensitive.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render to manifest-file syntax: one `Key: value` line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Parse rendered manifest text back into ordered entries.
    pub fn parse(text: &str) -> Result<Self> {
        let mut manifest = Self::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line.split_once(": ").ok_or_else(|| {
                PlugforgeError::Configuration(format!("malformed manifest line: '{line}'"))
            })?;
            manifest.insert(key, value)?;
        }
        Ok(manifest)
    }

    /// SHA-256 digest of the rendered manifest, for determinism checks and
    /// logging.
    pub fn content_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.render().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Write the rendered manifest, creating parent directories as needed.
    /// The output path is write-once per build.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        Ok(())
    }
}

/// Merge producer fragments with externally supplied metadata and the
/// resolved version into one final manifest.
///
/// Required keys are seeded from `metadata` and `version` first; fragments
/// are applied in declared order afterwards. A key re-inserted with a
/// different value fails with [`PlugforgeError::ManifestConflict`]; a
/// missing or empty required key fails with
/// [`PlugforgeError::IncompleteManifest`].
pub fn merge(
    fragments: &[ManifestFragment],
    version: &str,
    metadata: &PluginMetadata,
) -> Result<FinalManifest> {
    let mut manifest = FinalManifest::new();

    manifest.insert("Plugin-Id", &metadata.plugin_id)?;
    manifest.insert("Long-Name", &metadata.display_name)?;
    manifest.insert("Plugin-Version", version)?;
    manifest.insert("Minimum-Java-Version", &metadata.minimum_java_version)?;
    manifest.insert("Core-Version", &metadata.core_version)?;
    manifest.insert("Minimum-Core-Version", &metadata.minimum_core_version)?;
    if let Some(group_id) = &metadata.group_id {
        manifest.insert("Group-Id", group_id)?;
    }
    if let Some(home_page) = &metadata.home_page {
        manifest.insert("Url", home_page)?;
    }
    if metadata.sandboxed {
        manifest.insert("Sandboxed", "true")?;
    }
    if metadata.plugin_first_class_loader {
        manifest.insert("Plugin-First-Class-Loader", "true")?;
    }
    if let Some(masked) = metadata.masked_classes_attribute() {
        manifest.insert("Mask-Classes", &masked)?;
    }
    if let Some(developers) = metadata.developers_attribute() {
        manifest.insert("Plugin-Developers", &developers)?;
    }

    for fragment in fragments {
        for (key, value) in fragment.iter() {
            manifest.insert(key, value)?;
        }
    }

    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| manifest.get(key).map(str::trim).unwrap_or("").is_empty())
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PlugforgeError::IncompleteManifest { missing });
    }

    info!(
        entries = manifest.len(),
        digest = %manifest.content_digest(),
        "assembled final manifest"
    );
    Ok(manifest)
}
