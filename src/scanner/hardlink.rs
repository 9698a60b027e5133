//! Inode-based hardlink detection.
//!
//! # Overview
//!
//! Hardlinks are multiple directory entries pointing to the same inode on disk.
//! The archive metadata layer uses [`InodeTracker`] to notice when a regular
//! file shares its inode with a file it has already described, and marks it as
//! a link to that first name.
//!
//! This detection is only a hint. Inode numbers are reused across snapshots
//! and file versions, so the archive sink throws the marking away and decides
//! links itself by comparing content.
//!
//! # Platform Support
//!
//! - **Unix**: Uses (device_id, inode) pairs from file metadata
//! - **Other**: Detection disabled (no file is ever reported as a link)

use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Remembers the first path seen for every multiply-linked inode.
///
/// `InodeTracker` is NOT thread-safe; the archive sink owns one per run.
#[derive(Debug, Default)]
pub struct InodeTracker {
    /// First path recorded for each inode key
    seen: HashMap<InodeKey, PathBuf>,
}

impl InodeTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    /// Observe a regular file and return the earlier name it is linked to.
    ///
    /// Only files whose link count is above one are recorded. Returns `None`
    /// for the first name of an inode, for files observed again under the
    /// same name, and on platforms without inode information.
    pub fn observe(&mut self, path: &Path, metadata: &Metadata) -> Option<PathBuf> {
        if link_count(metadata) <= 1 {
            return None;
        }
        let key = InodeKey::from_metadata(metadata)?;
        match self.seen.get(&key) {
            Some(first) if first != path => Some(first.clone()),
            Some(_) => None,
            None => {
                self.seen.insert(key, path.to_path_buf());
                None
            }
        }
    }
}

#[cfg(unix)]
fn link_count(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink()
}

#[cfg(not(unix))]
fn link_count(_metadata: &Metadata) -> u64 {
    1
}

/// Platform-specific inode key: (device_id, inode) on Unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InodeKey {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    _phantom: (),
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}
