//! Access-modifier verification: isolated per-unit checks of annotated
//! access restrictions, with aggregated violation reports.

pub mod report;
pub mod verifier;
