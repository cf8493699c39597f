//! Shared domain types: error taxonomy and externally supplied plugin metadata.

pub mod error;
pub mod metadata;
