//! Entry-class producer: finds the sole concrete subtype of the plugin base
//! type across the compiled-output directories.

use std::path::PathBuf;

use tracing::debug;

use super::index::ClassIndex;
use crate::domain::error::{PlugforgeError, Result};
use crate::manifest::fragment::ManifestFragment;

/// Manifest key contributed by this producer.
pub const PLUGIN_CLASS_KEY: &str = "Plugin-Class";

/// Producer name used for fragment attribution.
pub const PRODUCER: &str = "entry-class";

/// Scan the given directories for the plugin's entry class.
///
/// Zero candidates is valid (the plugin has no custom entry point) and
/// yields an empty fragment. More than one candidate is ambiguous and fails
/// with an analysis error naming every candidate.
pub fn produce(dirs: &[PathBuf], base_type: &str) -> Result<ManifestFragment> {
    let index = ClassIndex::load_dirs(dirs)?;
    let candidates = index.concrete_subtypes_of(base_type);

    let mut fragment = ManifestFragment::new(PRODUCER);
    match candidates.as_slice() {
        [] => {
            debug!(base_type, "no entry class found, plugin has no custom entry point");
        }
        [sole] => {
            fragment.insert(PLUGIN_CLASS_KEY, &sole.name);
        }
        many => {
            return Err(PlugforgeError::analysis(
                "ambiguous entry class",
                many.iter().map(|c| c.name.clone()).collect(),
            ));
        }
    }
    Ok(fragment)
}
