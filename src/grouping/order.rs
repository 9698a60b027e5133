//! Emission order for grouped files.
//!
//! # Algorithm
//!
//! 1. All records are sorted by `(extension, base name, directory)`, which
//!    clusters files of the same type and name for compression locality.
//! 2. The sorted records are walked once. The first record of each
//!    fingerprint not seen before pulls in its whole group, so identical
//!    content always ends up contiguous.
//! 3. Members of a group are ordered by their full path, compared as raw
//!    bytes.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::FingerprintGroups;
use crate::scanner::{FileRecord, Hash};

/// One fingerprint group ready to be emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionGroup {
    /// Fingerprint shared by every path in the group
    pub fingerprint: Hash,
    /// Member paths in emission order
    pub paths: Vec<PathBuf>,
}

/// Compute the emission order for all grouped files.
///
/// Every recorded file appears exactly once across the returned groups.
///
/// # Example
///
/// ```
/// use tarsort::grouping::{emission_order, FingerprintGroups};
/// use tarsort::scanner::FileRecord;
/// use std::path::PathBuf;
///
/// let mut groups = FingerprintGroups::new();
/// for (path, fp) in [("z.txt", 1u8), ("a.md", 2), ("b.txt", 3)] {
///     groups.insert(FileRecord::new(PathBuf::from(path), [fp; 32]));
/// }
///
/// let order: Vec<_> = emission_order(&groups)
///     .into_iter()
///     .flat_map(|g| g.paths)
///     .collect();
/// assert_eq!(order, ["a.md", "b.txt", "z.txt"].map(PathBuf::from));
/// ```
#[must_use]
pub fn emission_order(groups: &FingerprintGroups) -> Vec<EmissionGroup> {
    let mut records: Vec<&FileRecord> = groups.records().collect();
    records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut done: HashSet<Hash> = HashSet::with_capacity(groups.group_count());
    let mut order = Vec::with_capacity(groups.group_count());

    for record in records {
        if !done.insert(record.fingerprint) {
            continue;
        }
        let mut paths: Vec<PathBuf> = groups
            .get(&record.fingerprint)
            .unwrap_or_default()
            .iter()
            .map(|member| member.path.clone())
            .collect();
        paths.sort_by(|a, b| compare_paths(a, b));

        order.push(EmissionGroup {
            fingerprint: record.fingerprint,
            paths,
        });
    }

    order
}

/// Lexicographic comparison of whole path strings.
///
/// Unlike `Path`'s own ordering this does not compare component by
/// component, so `a.b` sorts before `a/b`.
#[must_use]
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    a.as_os_str().cmp(b.as_os_str())
}
