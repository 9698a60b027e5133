//! Output sinks for scanned entries.
//!
//! This module provides the two kinds of output a run can produce:
//! - [`ListSink`]: one path per line (or NUL-terminated)
//! - [`ArchiveSink`]: a streaming tar archive, optionally hardlinking
//!   identical files
//!
//! Both implement [`Sink`], which [`Tree`](crate::tree::Tree) drives in
//! emission order.
//!
//! # Example
//!
//! ```
//! use tarsort::output::{EntryKind, ListSink, Separator, Sink};
//! use std::path::Path;
//!
//! let mut sink = ListSink::new(Vec::new(), Separator::Nul);
//! sink.emit(Path::new("a.txt"), EntryKind::File, &[]).unwrap();
//! sink.finish().unwrap();
//! assert_eq!(sink.into_inner(), b"a.txt\0");
//! ```

pub mod archive;
pub mod header;
pub mod list;

use std::path::{Path, PathBuf};

use thiserror::Error;

// Re-export main types
pub use archive::ArchiveSink;
pub use header::{EntryMetadata, Mtime};
pub use list::{ListSink, Separator};

/// What the scanner classified an entry as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory marker (path ends with a separator)
    Directory,
    /// A regular file
    File,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Directory => write!(f, "directory"),
            EntryKind::File => write!(f, "regular file"),
        }
    }
}

/// How a sink represented an emitted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Written as a path in a listing
    Listed,
    /// Written as an archive directory entry
    Directory,
    /// Archived with its full content
    Stored {
        /// Bytes of content written
        size: u64,
    },
    /// Archived as a hardlink to an earlier member
    Linked {
        /// Path of the member it links to
        target: PathBuf,
    },
}

impl Emission {
    /// Whether later members of the same group may link to this one.
    #[must_use]
    pub fn is_link_candidate(&self) -> bool {
        matches!(self, Emission::Stored { .. })
    }
}

/// Destination for scanned entries.
///
/// Implementations are selected once per run and receive every entry
/// exactly once, directories during the scan and files afterwards.
pub trait Sink {
    /// Emit one entry.
    ///
    /// `link_candidates` lists earlier members of the same content group
    /// that were stored with full content, in emission order. It is empty
    /// for directories and for sinks that do not ask for candidates.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the run.
    fn emit(
        &mut self,
        path: &Path,
        kind: EntryKind,
        link_candidates: &[PathBuf],
    ) -> Result<Emission, EmitError>;

    /// Whether the caller should collect link candidates for this sink.
    fn wants_link_candidates(&self) -> bool {
        false
    }

    /// Flush buffered output and write any trailer.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Write`] if the output cannot be completed.
    fn finish(&mut self) -> Result<(), EmitError>;
}

/// Errors that can occur while emitting entries.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Reading metadata or content of a source path failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path being read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing to the output failed.
    #[error("Failed to write output: {0}")]
    Write(#[source] std::io::Error),

    /// The archive metadata disagrees with what the scan found.
    #[error("{path}: archive metadata says {found}, scan found {expected}")]
    TypeMismatch {
        /// Path of the entry
        path: PathBuf,
        /// Kind reported by the scanner
        expected: EntryKind,
        /// Kind derived from the entry's metadata
        found: String,
    },
}

impl EmitError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
