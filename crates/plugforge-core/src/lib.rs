//! plugforge core - build-time metadata for packaged plugin artifacts.
//!
//! Three independent cores feed one build:
//! - `version`: resolves the effective artifact version from a configured
//!   strategy (project version, fixed string, or git depth + hash)
//! - `scan` + `manifest`: independent analyzers each emit a partial manifest
//!   (fragment); the merger combines fragments with externally supplied
//!   plugin metadata into one ordered, conflict-checked manifest
//! - `accmod`: fans out isolated per-compilation-unit access-modifier checks
//!   and aggregates violation reports

pub mod accmod;
pub mod config;
pub mod domain;
pub mod manifest;
pub mod scan;
pub mod version;

// Re-export key types
pub use accmod::report::{CompilationUnit, UnitState, VerifyOutcome, Violation, ViolationReport};
pub use accmod::verifier::{AccessModifierVerifier, CheckRequest, IsolatedChecker, ProcessChecker};
pub use config::BuildConfig;
pub use domain::error::{PlugforgeError, Result};
pub use domain::metadata::{PluginDeveloper, PluginMetadata};
pub use manifest::fragment::ManifestFragment;
pub use manifest::merge::{merge, FinalManifest};
pub use scan::dependencies::{ArtifactKind, ClasspathEntry, Coordinate, DependencyScope};
pub use scan::index::{ClassIndex, ClassRecord, DynamicLoadable, ExtensionMarker};
pub use version::{GitVersionConfig, ResolvedVersion, VersionSpec, VersionStrategy};
