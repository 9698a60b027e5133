//! Streaming tar archive output.
//!
//! # Overview
//!
//! [`ArchiveSink`] writes every emitted entry to a `tar` stream with
//! reproducible metadata:
//!
//! - directories are `0755`, files `0644`
//! - owner and group are `0`/`root` and `0`/`wheel`
//! - modification times are kept from the source
//!
//! Inode-based link detection from the metadata layer is always discarded.
//! Inode numbers repeat across snapshots and file versions, so trusting them
//! can produce archives whose links point at different content.
//!
//! With hardlinks enabled, a non-empty file becomes a link to an earlier
//! member of its content group only if both have exactly the same
//! modification time and byte-identical content. Common extractors give a
//! hard link the target's timestamp, so linking files with different times
//! would silently change one of them.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tar::{Builder, EntryType};

use super::header::{EntryMetadata, Mtime};
use super::{EmitError, Emission, EntryKind, Sink};
use crate::scanner::{same_content, InodeTracker};

/// Sink that writes a tar archive.
pub struct ArchiveSink<W: Write> {
    builder: Builder<W>,
    hardlinks: bool,
    tracker: InodeTracker,
    report: Option<Box<dyn Write>>,
}

impl<W: Write> std::fmt::Debug for ArchiveSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSink")
            .field("hardlinks", &self.hardlinks)
            .field("verbose", &self.report.is_some())
            .finish_non_exhaustive()
    }
}

impl<W: Write> ArchiveSink<W> {
    /// Create an archive sink writing to `writer`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tarsort::output::{ArchiveSink, EntryKind, Sink};
    /// use std::path::Path;
    ///
    /// let mut sink = ArchiveSink::new(Vec::new(), true);
    /// sink.emit(Path::new("docs/"), EntryKind::Directory, &[]).unwrap();
    /// sink.finish().unwrap();
    /// ```
    #[must_use]
    pub fn new(writer: W, hardlinks: bool) -> Self {
        Self {
            builder: Builder::new(writer),
            hardlinks,
            tracker: InodeTracker::new(),
            report: None,
        }
    }

    /// Report every entry (`path` or `path -> target`) to standard error.
    #[must_use]
    pub fn verbose(self) -> Self {
        self.with_report(Box::new(io::stderr()))
    }

    /// Report every entry to `report` instead of standard error.
    #[must_use]
    pub fn with_report(mut self, report: Box<dyn Write>) -> Self {
        self.report = Some(report);
        self
    }

    /// Finish the archive and recover the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`EmitError::Write`] if the trailer cannot be written.
    pub fn into_inner(self) -> Result<W, EmitError> {
        self.builder.into_inner().map_err(EmitError::Write)
    }

    /// Find an earlier group member this file can link to.
    fn find_link_target<'c>(
        &self,
        path: &Path,
        mtime: Mtime,
        candidates: &'c [PathBuf],
    ) -> Result<Option<&'c PathBuf>, EmitError> {
        for candidate in candidates {
            let metadata =
                std::fs::symlink_metadata(candidate).map_err(|e| EmitError::io(candidate, e))?;
            let candidate_mtime =
                Mtime::from_metadata(&metadata).map_err(|e| EmitError::io(candidate, e))?;
            if candidate_mtime != mtime {
                log::trace!(
                    "Not linking {} to {}: modification times differ",
                    path.display(),
                    candidate.display()
                );
                continue;
            }
            let identical = same_content(path, candidate)
                .map_err(|e| EmitError::Io {
                    path: e.path,
                    source: e.source,
                })?;
            if identical {
                return Ok(Some(candidate));
            }
            log::debug!(
                "{} and {} share a fingerprint but differ in content",
                path.display(),
                candidate.display()
            );
        }
        Ok(None)
    }

    fn report_entry(&mut self, path: &Path, meta: &EntryMetadata) -> Result<(), EmitError> {
        let Some(report) = self.report.as_mut() else {
            return Ok(());
        };
        match &meta.link_target {
            Some(target) => writeln!(report, "{} -> {}", path.display(), target.display()),
            None => writeln!(report, "{}", path.display()),
        }
        .map_err(EmitError::Write)
    }
}

impl<W: Write> Sink for ArchiveSink<W> {
    fn emit(
        &mut self,
        path: &Path,
        kind: EntryKind,
        link_candidates: &[PathBuf],
    ) -> Result<Emission, EmitError> {
        let mut meta =
            EntryMetadata::inspect(path, &mut self.tracker).map_err(|e| EmitError::io(path, e))?;

        if let Some(first) = meta.link_target.as_deref().filter(|_| meta.is_link()) {
            log::debug!(
                "Ignoring inode link {} -> {}",
                path.display(),
                first.display()
            );
            meta.clear_link();
        }

        let matches_scan = match kind {
            EntryKind::Directory => meta.entry_type == EntryType::Directory,
            EntryKind::File => meta.is_regular(),
        };
        if !matches_scan {
            return Err(EmitError::TypeMismatch {
                path: path.to_path_buf(),
                expected: kind,
                found: meta.type_name().to_string(),
            });
        }

        meta.normalize_ownership();

        if self.hardlinks && kind == EntryKind::File && meta.size > 0 {
            if let Some(target) = self.find_link_target(path, meta.mtime, link_candidates)? {
                meta.link_to(target);
            }
        }

        self.report_entry(path, &meta)?;

        let (header, pax) = meta.to_header().map_err(|e| EmitError::io(path, e))?;
        if !pax.is_empty() {
            self.builder
                .append_pax_extensions(pax.iter().map(|(key, value)| (*key, value.as_slice())))
                .map_err(EmitError::Write)?;
        }

        if meta.is_regular() {
            let file = File::open(path).map_err(|e| EmitError::io(path, e))?;
            self.builder
                .append(&header, file.take(meta.size))
                .map_err(EmitError::Write)?;
        } else {
            self.builder
                .append(&header, io::empty())
                .map_err(EmitError::Write)?;
        }

        Ok(match (meta.entry_type, meta.link_target) {
            (EntryType::Directory, _) => Emission::Directory,
            (_, Some(target)) => Emission::Linked { target },
            _ => Emission::Stored { size: meta.size },
        })
    }

    fn wants_link_candidates(&self) -> bool {
        self.hardlinks
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        self.builder.finish().map_err(EmitError::Write)?;
        self.builder.get_mut().flush().map_err(EmitError::Write)?;
        if let Some(report) = self.report.as_mut() {
            report.flush().map_err(EmitError::Write)?;
        }
        Ok(())
    }
}
