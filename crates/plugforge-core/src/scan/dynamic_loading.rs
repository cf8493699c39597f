//! Dynamic-loading producer: aggregates the extension markers' declared
//! dynamic-loading behavior into one summary manifest value.

use std::path::PathBuf;

use tracing::debug;

use super::index::{ClassIndex, DynamicLoadable};
use crate::domain::error::Result;
use crate::manifest::fragment::ManifestFragment;

/// Manifest key contributed by this producer.
pub const SUPPORT_DYNAMIC_LOADING_KEY: &str = "Support-Dynamic-Loading";

/// Producer name used for fragment attribution.
pub const PRODUCER: &str = "dynamic-loading";

/// Aggregate extension markers across the given directories.
///
/// Any `no` marker vetoes dynamic loading. All markers `yes` (and at least
/// one present) affirms it. Any `maybe`, or no markers at all, omits the key:
/// the conservative default leaves the host to decide.
pub fn produce(dirs: &[PathBuf]) -> Result<ManifestFragment> {
    let index = ClassIndex::load_dirs(dirs)?;
    let markers = index.extension_markers();

    let mut fragment = ManifestFragment::new(PRODUCER);
    if markers.is_empty() {
        debug!("no extension markers found, dynamic-loading support unknown");
        return Ok(fragment);
    }

    if markers
        .iter()
        .any(|m| m.dynamic_loadable == DynamicLoadable::No)
    {
        fragment.insert(SUPPORT_DYNAMIC_LOADING_KEY, "false");
    } else if markers
        .iter()
        .all(|m| m.dynamic_loadable == DynamicLoadable::Yes)
    {
        fragment.insert(SUPPORT_DYNAMIC_LOADING_KEY, "true");
    } else {
        debug!(
            markers = markers.len(),
            "mixed dynamic-loading markers, omitting summary"
        );
    }
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::index::INDEX_FILE_NAME;

    fn dir_with_markers(markers: &[&str]) -> tempfile::TempDir {
        let classes: Vec<String> = markers
            .iter()
            .enumerate()
            .map(|(i, m)| {
                format!(
                    r#"{{"name": "com.acme.Ext{i}", "concrete": true,
                        "extension": {{"dynamic_loadable": "{m}"}}}}"#
                )
            })
            .collect();
        let json = format!(r#"{{"classes": [{}]}}"#, classes.join(","));
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE_NAME), json).unwrap();
        dir
    }

    fn produce_for(dir: &tempfile::TempDir) -> ManifestFragment {
        produce(&[dir.path().to_path_buf()]).unwrap()
    }

    #[test]
    fn test_no_markers_omits_key() {
        let dir = dir_with_markers(&[]);
        assert!(produce_for(&dir).is_empty());
    }

    #[test]
    fn test_all_yes_affirms() {
        let dir = dir_with_markers(&["yes", "yes", "yes"]);
        let fragment = produce_for(&dir);
        assert_eq!(fragment.get(SUPPORT_DYNAMIC_LOADING_KEY), Some("true"));
    }

    #[test]
    fn test_single_no_vetoes() {
        let dir = dir_with_markers(&["yes", "no", "yes"]);
        let fragment = produce_for(&dir);
        assert_eq!(fragment.get(SUPPORT_DYNAMIC_LOADING_KEY), Some("false"));
    }

    #[test]
    fn test_maybe_omits_key() {
        let dir = dir_with_markers(&["yes", "maybe"]);
        assert!(produce_for(&dir).is_empty());
    }

    #[test]
    fn test_no_beats_maybe() {
        let dir = dir_with_markers(&["maybe", "no"]);
        let fragment = produce_for(&dir);
        assert_eq!(fragment.get(SUPPORT_DYNAMIC_LOADING_KEY), Some("false"));
    }
}
