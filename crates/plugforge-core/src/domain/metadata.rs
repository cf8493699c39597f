//! Externally supplied plugin metadata, handed in by the host build
//! orchestrator and merged into the final manifest.

use serde::{Deserialize, Serialize};

/// One entry of the plugin's developer list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginDeveloper {
    /// Account id, e.g. the forge username.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Contact email.
    pub email: String,
}

impl PluginDeveloper {
    /// Manifest rendering of one developer: `name:id:email`.
    pub fn render(&self) -> String {
        format!("{}:{}:{}", self.name, self.id, self.email)
    }
}

/// Plugin metadata supplied by the host build orchestrator.
///
/// Immutable for the duration of one build invocation. The merger owns the
/// decision of which fields become required manifest keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginMetadata {
    /// Short plugin id used in the manifest and artifact coordinates.
    pub plugin_id: String,

    /// Human-readable display name.
    pub display_name: String,

    /// Group id of the published artifact, if any.
    #[serde(default)]
    pub group_id: Option<String>,

    /// Home page URL, if any.
    #[serde(default)]
    pub home_page: Option<String>,

    /// Minimum Java language version the plugin runs on.
    pub minimum_java_version: String,

    /// Host core version the plugin is compiled against.
    pub core_version: String,

    /// Oldest host core version the plugin is compatible with.
    pub minimum_core_version: String,

    /// Whether the plugin runs sandboxed in the host.
    #[serde(default)]
    pub sandboxed: bool,

    /// Whether the plugin's own class loader wins over the host's.
    #[serde(default)]
    pub plugin_first_class_loader: bool,

    /// Classes masked from the plugin's class-loading visibility.
    #[serde(default)]
    pub masked_classes: Vec<String>,

    /// Developer list, rendered comma-joined in the manifest.
    #[serde(default)]
    pub developers: Vec<PluginDeveloper>,
}

impl PluginMetadata {
    /// Manifest rendering of the developer list, or `None` when empty.
    pub fn developers_attribute(&self) -> Option<String> {
        if self.developers.is_empty() {
            return None;
        }
        Some(
            self.developers
                .iter()
                .map(PluginDeveloper::render)
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    /// Manifest rendering of the masked-classes list, or `None` when empty.
    pub fn masked_classes_attribute(&self) -> Option<String> {
        if self.masked_classes.is_empty() {
            return None;
        }
        Some(self.masked_classes.join(" "))
    }
}
