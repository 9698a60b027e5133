//! Fingerprint grouping of scanned files.
//!
//! # Overview
//!
//! Every regular file found by the scan is filed under its content
//! fingerprint. Records within a group keep discovery order; sorting is
//! left to [`emission_order`](super::emission_order).
//!
//! Two files with the same fingerprint are treated as having the same
//! content. A digest collision would merge unrelated files into one group,
//! and nothing here tries to detect that.
//!
//! # Example
//!
//! ```
//! use tarsort::grouping::FingerprintGroups;
//! use tarsort::scanner::FileRecord;
//! use std::path::PathBuf;
//!
//! let mut groups = FingerprintGroups::new();
//! groups.insert(FileRecord::new(PathBuf::from("a.txt"), [1u8; 32]));
//! groups.insert(FileRecord::new(PathBuf::from("b/a.txt"), [1u8; 32]));
//! groups.insert(FileRecord::new(PathBuf::from("c.md"), [2u8; 32]));
//!
//! assert_eq!(groups.file_count(), 3);
//! assert_eq!(groups.group_count(), 2);
//! ```

use std::collections::HashMap;

use crate::scanner::{FileRecord, Hash};

/// Mapping from fingerprint to the files sharing it.
#[derive(Debug, Default, Clone)]
pub struct FingerprintGroups {
    groups: HashMap<Hash, Vec<FileRecord>>,
    file_count: usize,
}

impl FingerprintGroups {
    /// Create an empty grouping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File a record under its fingerprint, after any earlier members.
    pub fn insert(&mut self, record: FileRecord) {
        self.groups
            .entry(record.fingerprint)
            .or_default()
            .push(record);
        self.file_count += 1;
    }

    /// Members sharing `fingerprint`, in discovery order.
    #[must_use]
    pub fn get(&self, fingerprint: &Hash) -> Option<&[FileRecord]> {
        self.groups.get(fingerprint).map(Vec::as_slice)
    }

    /// Iterate over every record in every group.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.groups.values().flatten()
    }

    /// Total number of records.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of groups holding more than one file.
    #[must_use]
    pub fn duplicate_group_count(&self) -> usize {
        self.groups.values().filter(|g| g.len() > 1).count()
    }

    /// Check whether no files were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}
