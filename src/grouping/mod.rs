//! Content grouping and emission ordering.
//!
//! - [`groups`]: fingerprint-keyed collection of scanned files
//! - [`order`]: the final order in which files are handed to a sink

pub mod groups;
pub mod order;

pub use groups::FingerprintGroups;
pub use order::{compare_paths, emission_order, EmissionGroup};
