//! Scan, order and emit.
//!
//! [`Tree`] runs the two stages of a run against one [`Sink`]:
//!
//! 1. [`Tree::scan`] walks a root. Directories go to the sink straight away;
//!    regular files are fingerprinted and collected into
//!    [`FingerprintGroups`].
//! 2. [`Tree::process`] computes the emission order over everything
//!    collected and hands each file to the sink, collecting link
//!    candidates per content group when the sink wants them.
//!
//! # Example
//!
//! ```no_run
//! use tarsort::output::{ListSink, Separator};
//! use tarsort::scanner::Hasher;
//! use tarsort::tree::Tree;
//! use std::path::Path;
//!
//! let sink = ListSink::new(std::io::stdout().lock(), Separator::Newline);
//! let mut tree = Tree::new(sink, Hasher::new());
//! tree.scan(Path::new(".")).unwrap();
//! tree.process().unwrap();
//! tree.finish().unwrap();
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::grouping::{emission_order, FingerprintGroups};
use crate::output::{EmitError, Emission, EntryKind, Sink};
use crate::scanner::{hash_to_hex, FileRecord, Hasher, ScanError, WalkEvent, Walker};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Walking or hashing failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Writing an entry failed.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Counters collected over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Directory entries emitted
    pub directories: usize,
    /// Regular files emitted
    pub files: usize,
    /// Distinct content groups
    pub groups: usize,
    /// Content groups with more than one member
    pub duplicate_groups: usize,
    /// Files emitted as hardlinks
    pub linked: usize,
    /// Bytes of file content written to an archive
    pub bytes_stored: u64,
}

/// One run over a set of roots.
#[derive(Debug)]
pub struct Tree<S: Sink> {
    sink: S,
    hasher: Hasher,
    groups: FingerprintGroups,
    summary: RunSummary,
}

impl<S: Sink> Tree<S> {
    /// Create a run writing to `sink`.
    #[must_use]
    pub fn new(sink: S, hasher: Hasher) -> Self {
        Self {
            sink,
            hasher,
            groups: FingerprintGroups::new(),
            summary: RunSummary::default(),
        }
    }

    /// Walk `root`, emitting directories and collecting regular files.
    ///
    /// # Errors
    ///
    /// Stops at the first unsupported entry, I/O failure or sink error.
    pub fn scan(&mut self, root: &Path) -> Result<(), TreeError> {
        log::debug!("Scanning {}", root.display());
        for event in Walker::new(root).walk() {
            match event? {
                WalkEvent::Directory(marker) => {
                    self.sink.emit(&marker, EntryKind::Directory, &[])?;
                    self.summary.directories += 1;
                }
                WalkEvent::File(path) => {
                    let fingerprint = self.hasher.full_hash(&path).map_err(ScanError::from)?;
                    log::trace!("{} {}", hash_to_hex(&fingerprint), path.display());
                    self.groups.insert(FileRecord::new(path, fingerprint));
                }
            }
        }
        Ok(())
    }

    /// Emit every collected file in emission order.
    ///
    /// # Errors
    ///
    /// Stops at the first sink error.
    pub fn process(&mut self) -> Result<(), TreeError> {
        log::info!(
            "Collected {} files in {} content groups ({} with duplicates)",
            self.groups.file_count(),
            self.groups.group_count(),
            self.groups.duplicate_group_count()
        );

        let collect_candidates = self.sink.wants_link_candidates();
        let order = emission_order(&self.groups);
        self.summary.groups += order.len();
        self.summary.duplicate_groups += self.groups.duplicate_group_count();

        for group in order {
            let mut candidates: Vec<PathBuf> = Vec::new();
            for path in group.paths {
                let emission = self.sink.emit(&path, EntryKind::File, &candidates)?;
                self.summary.files += 1;
                match &emission {
                    Emission::Linked { .. } => self.summary.linked += 1,
                    Emission::Stored { size } => self.summary.bytes_stored += size,
                    _ => {}
                }
                if collect_candidates && emission.is_link_candidate() {
                    candidates.push(path);
                }
            }
        }

        self.groups = FingerprintGroups::new();
        Ok(())
    }

    /// Finish the sink and return the run summary.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the output cannot be completed.
    pub fn finish(&mut self) -> Result<RunSummary, TreeError> {
        self.sink.finish()?;
        log::info!(
            "Emitted {} directories and {} files in {} groups ({} duplicated, {} as hardlinks, {} bytes stored)",
            self.summary.directories,
            self.summary.files,
            self.summary.groups,
            self.summary.duplicate_groups,
            self.summary.linked,
            self.summary.bytes_stored
        );
        Ok(self.summary)
    }

    /// Mutable access to the collected files.
    pub fn groups_mut(&mut self) -> &mut FingerprintGroups {
        &mut self.groups
    }

    /// Recover the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
