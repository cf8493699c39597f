//! Fragment producers: capability scans over the per-directory class
//! metadata index.
//!
//! The three producers are independent, read only immutable compiled output,
//! and each write a private [`crate::manifest::fragment::ManifestFragment`].

pub mod dependencies;
pub mod dynamic_loading;
pub mod entry_class;
pub mod index;
