//! Dependency producer: classifies resolved classpath entries and emits the
//! inter-plugin dependency list.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PlugforgeError, Result};
use crate::manifest::fragment::ManifestFragment;

/// Manifest key contributed by this producer.
pub const PLUGIN_DEPENDENCIES_KEY: &str = "Plugin-Dependencies";

/// Producer name used for fragment attribution.
pub const PRODUCER: &str = "dependencies";

/// What kind of artifact a classpath entry resolves to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A plugin artifact, recorded in the dependency list.
    Plugin,

    /// An ordinary library, ignored by this producer.
    Library,
}

/// Declared scope of a plugin dependency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    #[default]
    Required,
    Optional,
}

/// Coordinate metadata of a resolved artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coordinate {
    /// Artifact name (the plugin id for plugin artifacts).
    pub name: String,

    /// Resolved version.
    pub version: String,
}

/// One entry of the resolved compile classpath, as supplied by the host
/// orchestrator's classpath resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClasspathEntry {
    /// On-disk location of the artifact.
    pub path: PathBuf,

    /// Plugin artifact or plain library.
    pub kind: ArtifactKind,

    /// Declared scope; defaults to required.
    #[serde(default)]
    pub scope: DependencyScope,

    /// Coordinate metadata, when the resolver could determine it.
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

/// Emit the plugin dependency list for the resolved compile classpath.
///
/// Plugin entries render as `name:version`, optional ones with a
/// `;resolution:=optional` suffix, sorted by plugin name for determinism and
/// comma-joined. Libraries are skipped. A plugin entry without coordinate
/// metadata is an analysis failure naming every offending path.
pub fn produce(classpath: &[ClasspathEntry]) -> Result<ManifestFragment> {
    let mut missing_coordinates = Vec::new();
    let mut dependencies = Vec::new();

    for entry in classpath {
        if entry.kind != ArtifactKind::Plugin {
            continue;
        }
        match &entry.coordinate {
            Some(coordinate) => {
                dependencies.push((coordinate.name.clone(), coordinate.version.clone(), entry.scope));
            }
            None => missing_coordinates.push(entry.path.display().to_string()),
        }
    }

    if !missing_coordinates.is_empty() {
        return Err(PlugforgeError::analysis(
            "plugin classpath entry lacks coordinate metadata",
            missing_coordinates,
        ));
    }

    dependencies.sort_by(|a, b| a.0.cmp(&b.0));

    let mut fragment = ManifestFragment::new(PRODUCER);
    if dependencies.is_empty() {
        return Ok(fragment);
    }

    let rendered: Vec<String> = dependencies
        .iter()
        .map(|(name, version, scope)| match scope {
            DependencyScope::Required => format!("{name}:{version}"),
            DependencyScope::Optional => format!("{name}:{version};resolution:=optional"),
        })
        .collect();
    fragment.insert(PLUGIN_DEPENDENCIES_KEY, rendered.join(","));
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(name: &str, version: &str, scope: DependencyScope) -> ClasspathEntry {
        ClasspathEntry {
            path: PathBuf::from(format!("deps/{name}-{version}.hpi")),
            kind: ArtifactKind::Plugin,
            scope,
            coordinate: Some(Coordinate {
                name: name.into(),
                version: version.into(),
            }),
        }
    }

    fn library(name: &str) -> ClasspathEntry {
        ClasspathEntry {
            path: PathBuf::from(format!("deps/{name}.jar")),
            kind: ArtifactKind::Library,
            scope: DependencyScope::Required,
            coordinate: None,
        }
    }

    #[test]
    fn test_libraries_are_ignored() {
        let fragment = produce(&[library("guava"), library("slf4j-api")]).unwrap();
        assert!(fragment.is_empty());
    }

    #[test]
    fn test_plugins_sorted_by_name() {
        let fragment = produce(&[
            plugin("workflow-api", "1300.v1", DependencyScope::Required),
            plugin("git", "5.7.0", DependencyScope::Required),
            library("guava"),
        ])
        .unwrap();
        assert_eq!(
            fragment.get(PLUGIN_DEPENDENCIES_KEY),
            Some("git:5.7.0,workflow-api:1300.v1")
        );
    }

    #[test]
    fn test_optional_scope_renders_resolution_suffix() {
        let fragment = produce(&[
            plugin("git", "5.7.0", DependencyScope::Required),
            plugin("mailer", "472.v1", DependencyScope::Optional),
        ])
        .unwrap();
        assert_eq!(
            fragment.get(PLUGIN_DEPENDENCIES_KEY),
            Some("git:5.7.0,mailer:472.v1;resolution:=optional")
        );
    }

    #[test]
    fn test_plugin_without_coordinate_fails_naming_path() {
        let bare = ClasspathEntry {
            path: PathBuf::from("deps/mystery.hpi"),
            kind: ArtifactKind::Plugin,
            scope: DependencyScope::Required,
            coordinate: None,
        };
        match produce(&[bare]) {
            Err(PlugforgeError::Analysis { offenders, .. }) => {
                assert_eq!(offenders, vec!["deps/mystery.hpi"]);
            }
            other => panic!("expected Analysis error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_classpath_is_empty_fragment() {
        assert!(produce(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_classpath_entry_scope_defaults_to_required() {
        let json = r#"{"path": "deps/git-5.7.0.hpi", "kind": "plugin",
                       "coordinate": {"name": "git", "version": "5.7.0"}}"#;
        let entry: ClasspathEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.scope, DependencyScope::Required);
    }
}
