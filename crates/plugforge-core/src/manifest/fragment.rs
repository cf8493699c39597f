//! Partial manifests, each exclusively owned by one producer until handed
//! to the merger.

use serde::{Deserialize, Serialize};

/// An ordered key -> value mapping produced by exactly one analysis pass.
///
/// Keys within a fragment are producer-private; cross-producer collisions
/// are the merger's job to detect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFragment {
    producer: String,
    entries: Vec<(String, String)>,
}

impl ManifestFragment {
    /// Empty fragment attributed to the named producer.
    pub fn new(producer: impl Into<String>) -> Self {
        Self {
            producer: producer.into(),
            entries: Vec::new(),
        }
    }

    /// Name of the producer that owns this fragment.
    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// Append a key -> value entry, preserving insertion order.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Value for a key, if present.
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

    /// Whether this fragment contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
