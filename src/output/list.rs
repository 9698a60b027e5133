//! Plain path listing output.
//!
//! Writes each emitted path followed by a newline, or by a NUL byte for
//! consumers such as `xargs -0` and `tar --null -T -`.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{EmitError, Emission, EntryKind, Sink};

/// Path terminator for [`ListSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// `\n` after each path
    #[default]
    Newline,
    /// `\0` after each path
    Nul,
}

impl Separator {
    fn byte(self) -> u8 {
        match self {
            Separator::Newline => b'\n',
            Separator::Nul => b'\0',
        }
    }
}

/// Sink that lists paths.
#[derive(Debug)]
pub struct ListSink<W: Write> {
    writer: W,
    separator: Separator,
}

impl<W: Write> ListSink<W> {
    /// Create a list sink over `writer`.
    #[must_use]
    pub fn new(writer: W, separator: Separator) -> Self {
        Self { writer, separator }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for ListSink<W> {
    fn emit(
        &mut self,
        path: &Path,
        _kind: EntryKind,
        _link_candidates: &[PathBuf],
    ) -> Result<Emission, EmitError> {
        self.writer
            .write_all(path.as_os_str().as_encoded_bytes())
            .and_then(|()| self.writer.write_all(&[self.separator.byte()]))
            .map_err(EmitError::Write)?;
        Ok(Emission::Listed)
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        self.writer.flush().map_err(EmitError::Write)
    }
}
