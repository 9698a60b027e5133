//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a root path and
//! classifying every entry it finds. Traversal is single-threaded, depth-first
//! and pre-order: a directory is reported before any of its children, and
//! children come in the order the filesystem lists them. Nothing is sorted
//! here.
//!
//! Symbolic links are never followed, not even when the root itself is one.
//! Any entry that is not a directory or regular file ends the walk with
//! [`ScanError::UnsupportedFileType`].
//!
//! # Example
//!
//! ```no_run
//! use tarsort::scanner::{Walker, WalkEvent};
//! use std::path::Path;
//!
//! let files: Vec<_> = Walker::new(Path::new("/srv/data"))
//!     .walk()
//!     .filter_map(|event| match event {
//!         Ok(WalkEvent::File(path)) => Some(path),
//!         _ => None,
//!     })
//!     .collect();
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use walkdir::WalkDir;

use super::ScanError;

/// An entry classified by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A directory, already formatted as a marker ending in a separator.
    Directory(PathBuf),
    /// A regular file.
    File(PathBuf),
}

/// Directory walker for sequential file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
        }
    }

    /// Walk the tree, yielding classified entries.
    ///
    /// Iteration should stop at the first error; the walk is not meant to
    /// be resumed past an unsupported entry.
    pub fn walk(&self) -> impl Iterator<Item = Result<WalkEvent, ScanError>> {
        let root = self.root.clone();
        WalkDir::new(&self.root)
            .follow_links(false)
            .follow_root_links(false)
            .into_iter()
            .map(move |entry| {
                let entry = entry.map_err(|e| {
                    let path = e.path().map_or_else(|| root.clone(), Path::to_path_buf);
                    ScanError::Io {
                        path,
                        source: e.into(),
                    }
                })?;

                let file_type = entry.file_type();
                if file_type.is_dir() {
                    Ok(WalkEvent::Directory(directory_marker(entry.path())))
                } else if file_type.is_file() {
                    Ok(WalkEvent::File(entry.into_path()))
                } else {
                    log::debug!("Rejecting {}: {:?}", entry.path().display(), file_type);
                    Err(ScanError::UnsupportedFileType(entry.into_path()))
                }
            })
    }
}

/// Append a trailing separator to a directory path unless it already has one.
///
/// ```
/// use tarsort::scanner::walker::directory_marker;
/// use std::path::Path;
///
/// assert_eq!(directory_marker(Path::new("a/b")).to_str(), Some("a/b/"));
/// assert_eq!(directory_marker(Path::new("a/")).to_str(), Some("a/"));
/// ```
#[must_use]
pub fn directory_marker(path: &Path) -> PathBuf {
    let raw = path.as_os_str();
    let has_separator = raw
        .to_string_lossy()
        .ends_with(|c: char| c == '/' || c == MAIN_SEPARATOR);
    if has_separator {
        return path.to_path_buf();
    }
    let mut marker = OsString::with_capacity(raw.len() + 1);
    marker.push(raw);
    marker.push(MAIN_SEPARATOR.to_string());
    PathBuf::from(marker)
}
