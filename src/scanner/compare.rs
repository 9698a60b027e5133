//! Byte-for-byte file comparison.
//!
//! Used before turning an archive member into a hardlink, because a shared
//! fingerprint alone is not proof of identical content.

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

const COMPARE_CHUNK: usize = 64 * 1024;

/// Opening or reading one side of a comparison failed.
#[derive(Debug, Error)]
#[error("I/O error for {path}: {source}")]
pub struct CompareError {
    /// The file that could not be read
    pub path: PathBuf,
    /// The underlying I/O error
    #[source]
    pub source: io::Error,
}

impl CompareError {
    fn at(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Return `true` if both files have exactly the same bytes.
///
/// Sizes are compared first; only same-sized files are read, in
/// lock-step chunks, stopping at the first difference.
///
/// # Errors
///
/// Returns [`CompareError`] naming whichever file could not be opened or
/// read.
pub fn same_content(a: &Path, b: &Path) -> Result<bool, CompareError> {
    let mut file_a = File::open(a).map_err(CompareError::at(a))?;
    let mut file_b = File::open(b).map_err(CompareError::at(b))?;
    let len_a = file_a.metadata().map_err(CompareError::at(a))?.len();
    let len_b = file_b.metadata().map_err(CompareError::at(b))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    let mut buf_a = vec![0u8; COMPARE_CHUNK];
    let mut buf_b = vec![0u8; COMPARE_CHUNK];
    loop {
        let n = read_full(&mut file_a, &mut buf_a).map_err(CompareError::at(a))?;
        let m = read_full(&mut file_b, &mut buf_b).map_err(CompareError::at(b))?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as possible; a short count means end of file.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
