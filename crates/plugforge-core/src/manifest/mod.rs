//! Manifest fragments and the single-point merger that assembles them.

pub mod fragment;
pub mod merge;
