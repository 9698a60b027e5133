//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Sequential, listing-order directory walking using walkdir
//! - Content fingerprinting with BLAKE3
//! - Inode-based hardlink detection
//! - Byte-for-byte content verification
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and entry classification
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//! - [`hardlink`]: (device, inode) tracking
//! - [`compare`]: Full content comparison of two files
//!
//! # Example
//!
//! ```no_run
//! use tarsort::scanner::{Walker, WalkEvent};
//! use std::path::Path;
//!
//! for event in Walker::new(Path::new(".")).walk() {
//!     match event {
//!         Ok(WalkEvent::Directory(marker)) => println!("dir  {}", marker.display()),
//!         Ok(WalkEvent::File(path)) => println!("file {}", path.display()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

pub mod compare;
pub mod hardlink;
pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use compare::{same_content, CompareError};
pub use hardlink::InodeTracker;
pub use hasher::{hash_to_hex, Hash, Hasher, DEFAULT_CHUNK_SIZE};
pub use walker::{WalkEvent, Walker};

/// Identity of a scanned regular file.
///
/// Holds the fields the emission order is derived from. Created once per
/// regular file during the scan and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Directory part of the path (empty for bare file names)
    pub directory: String,
    /// Final path component
    pub base_name: String,
    /// Lowercased extension including its leading dot, or empty
    pub extension: String,
    /// Content fingerprint
    pub fingerprint: Hash,
    /// Path as discovered by the walk
    pub path: PathBuf,
}

impl FileRecord {
    /// Create a record for `path` with an already computed fingerprint.
    ///
    /// # Example
    ///
    /// ```
    /// use tarsort::scanner::FileRecord;
    /// use std::path::PathBuf;
    ///
    /// let record = FileRecord::new(PathBuf::from("docs/README.MD"), [0u8; 32]);
    /// assert_eq!(record.directory, "docs");
    /// assert_eq!(record.base_name, "README.MD");
    /// assert_eq!(record.extension, ".md");
    /// ```
    #[must_use]
    pub fn new(path: PathBuf, fingerprint: Hash) -> Self {
        let directory = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = split_extension(&base_name).to_lowercase();

        Self {
            directory,
            base_name,
            extension,
            fingerprint,
            path,
        }
    }

    /// Sort key used to cluster similar files: extension, then name, then directory.
    #[must_use]
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (&self.extension, &self.base_name, &self.directory)
    }
}

/// Return the extension of a file name, including the leading dot.
///
/// Leading dots are part of the stem, so `.bashrc` has no extension while
/// `archive.tar.gz` yields `.gz` and `file.` yields `.`.
#[must_use]
pub fn split_extension(base_name: &str) -> &str {
    let stem_start = base_name.len() - base_name.trim_start_matches('.').len();
    match base_name[stem_start..].rfind('.') {
        Some(idx) => &base_name[stem_start + idx..],
        None => "",
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The entry is neither a regular file nor a directory.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(PathBuf),

    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be fingerprinted.
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}
