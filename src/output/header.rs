//! Archive entry metadata and header construction.
//!
//! [`EntryMetadata`] is what the archive sink decides on before anything is
//! written: entry type, size, times, ownership and link target. It is read
//! from the filesystem without following symlinks, adjusted by the sink, and
//! finally turned into a ustar [`tar::Header`] plus any PAX extended records
//! that the fixed-width header fields cannot carry.

use std::fs::Metadata;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::time::{SystemTime, UNIX_EPOCH};

use tar::{EntryType, Header};

use crate::scanner::InodeTracker;

/// Owner id written for every entry.
pub const OWNER_ID: u64 = 0;
/// Owner user name written for every entry.
pub const OWNER_USER: &str = "root";
/// Owner group name written for every entry.
pub const OWNER_GROUP: &str = "wheel";
/// Permissions for directory entries.
pub const DIR_MODE: u32 = 0o755;
/// Permissions for file and link entries.
pub const FILE_MODE: u32 = 0o644;

/// Width of the ustar name and linkname fields.
const NAME_FIELD_LEN: usize = 100;
/// Largest size the 12-byte octal size field can hold.
const MAX_OCTAL_SIZE: u64 = 0o77_777_777_777;

/// Modification time with nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Mtime {
    /// Whole seconds since the Unix epoch
    pub secs: u64,
    /// Sub-second part
    pub nanos: u32,
}

impl Mtime {
    /// Modification time from metadata; times before the epoch clamp to zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform does not report modification times.
    pub fn from_metadata(metadata: &Metadata) -> std::io::Result<Self> {
        Ok(Self::from_system_time(metadata.modified()?))
    }

    /// Convert a `SystemTime`, clamping pre-epoch times to zero.
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        time.duration_since(UNIX_EPOCH)
            .map(|d| Self {
                secs: d.as_secs(),
                nanos: d.subsec_nanos(),
            })
            .unwrap_or_default()
    }

    /// Decimal `secs[.fraction]` form used by PAX `mtime` records.
    ///
    /// ```
    /// use tarsort::output::Mtime;
    ///
    /// assert_eq!(Mtime { secs: 10, nanos: 0 }.to_pax(), "10");
    /// assert_eq!(Mtime { secs: 10, nanos: 500_000_000 }.to_pax(), "10.5");
    /// ```
    #[must_use]
    pub fn to_pax(&self) -> String {
        if self.nanos == 0 {
            return self.secs.to_string();
        }
        let fraction = format!("{:09}", self.nanos);
        format!("{}.{}", self.secs, fraction.trim_end_matches('0'))
    }
}

/// Metadata for one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Name stored in the archive, `/`-separated, never absolute
    pub name: Vec<u8>,
    /// Entry type (directory, regular or hard link)
    pub entry_type: EntryType,
    /// Content size written after the header (0 unless regular)
    pub size: u64,
    /// Size of the source file on disk
    pub source_size: u64,
    /// Modification time of the source
    pub mtime: Mtime,
    /// Permission bits
    pub mode: u32,
    /// Numeric owner
    pub uid: u64,
    /// Numeric group
    pub gid: u64,
    /// Owner name
    pub uname: String,
    /// Group name
    pub gname: String,
    /// Source path of the link target, for hard link entries
    pub link_target: Option<PathBuf>,
}

impl EntryMetadata {
    /// Read metadata for `path` without following symlinks.
    ///
    /// The inode tracker plays the part of a conventional archiver's link
    /// detection: a regular file sharing its inode with an earlier name comes
    /// back as a hard link to that name.
    ///
    /// # Errors
    ///
    /// Propagates the error from reading the file's metadata.
    pub fn inspect(path: &Path, tracker: &mut InodeTracker) -> std::io::Result<Self> {
        let metadata = std::fs::symlink_metadata(path)?;
        let file_type = metadata.file_type();
        let mtime = Mtime::from_metadata(&metadata)?;
        let (uid, gid) = owner_ids(&metadata);

        let (entry_type, size, link_target) = if file_type.is_dir() {
            (EntryType::Directory, 0, None)
        } else if file_type.is_file() {
            // Mirrors a conventional archiver's inode-based link detection.
            match tracker.observe(path, &metadata) {
                Some(first) => (EntryType::Link, 0, Some(first)),
                None => (EntryType::Regular, metadata.len(), None),
            }
        } else if file_type.is_symlink() {
            (EntryType::Symlink, 0, None)
        } else {
            (special_type(&file_type), 0, None)
        };

        Ok(Self {
            name: archive_name(path, file_type.is_dir()),
            entry_type,
            size,
            source_size: if file_type.is_file() { metadata.len() } else { 0 },
            mtime,
            mode: mode_bits(&metadata),
            uid,
            gid,
            uname: String::new(),
            gname: String::new(),
            link_target,
        })
    }

    /// Whether the entry is currently marked as a hard link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.entry_type == EntryType::Link
    }

    /// Whether the entry is a regular file with content.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.entry_type == EntryType::Regular
    }

    /// Turn a link back into a regular entry carrying the full content.
    pub fn clear_link(&mut self) {
        self.entry_type = EntryType::Regular;
        self.link_target = None;
        self.size = self.source_size;
    }

    /// Represent the entry as a hard link to `target`.
    pub fn link_to(&mut self, target: &Path) {
        self.entry_type = EntryType::Link;
        self.link_target = Some(target.to_path_buf());
        self.size = 0;
    }

    /// Replace ownership and permissions with the fixed archive values.
    pub fn normalize_ownership(&mut self) {
        self.mode = if self.entry_type == EntryType::Directory {
            DIR_MODE
        } else {
            FILE_MODE
        };
        self.uid = OWNER_ID;
        self.gid = OWNER_ID;
        self.uname = OWNER_USER.to_string();
        self.gname = OWNER_GROUP.to_string();
    }

    /// Human-readable name of the entry type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.entry_type {
            EntryType::Directory => "directory",
            EntryType::Regular => "regular file",
            EntryType::Link => "hard link",
            EntryType::Symlink => "symbolic link",
            EntryType::Fifo => "fifo",
            EntryType::Char => "character device",
            EntryType::Block => "block device",
            _ => "special file",
        }
    }

    /// Build the ustar header and the PAX records it needs.
    ///
    /// PAX records are emitted for names or link targets that are not ASCII
    /// or exceed 100 bytes, for sizes beyond the octal field, and for
    /// sub-second modification times.
    ///
    /// # Errors
    ///
    /// Fails if the owner names do not fit their header fields.
    pub fn to_header(&self) -> std::io::Result<(Header, Vec<(&'static str, Vec<u8>)>)> {
        let mut header = Header::new_ustar();
        let mut pax = Vec::new();

        if needs_pax_name(&self.name) {
            pax.push(("path", self.name.clone()));
        }
        copy_truncated(&mut header.as_old_mut().name, &self.name);

        if let Some(target) = &self.link_target {
            let link_name = archive_name(target, false);
            if needs_pax_name(&link_name) {
                pax.push(("linkpath", link_name.clone()));
            }
            copy_truncated(&mut header.as_old_mut().linkname, &link_name);
        }

        if self.size > MAX_OCTAL_SIZE {
            pax.push(("size", self.size.to_string().into_bytes()));
        }
        if self.mtime.nanos != 0 {
            pax.push(("mtime", self.mtime.to_pax().into_bytes()));
        }

        header.set_entry_type(self.entry_type);
        header.set_size(self.size);
        header.set_mode(self.mode);
        header.set_uid(self.uid);
        header.set_gid(self.gid);
        header.set_username(&self.uname)?;
        header.set_groupname(&self.gname)?;
        header.set_mtime(self.mtime.secs);
        header.set_cksum();

        Ok((header, pax))
    }
}

/// Name for `path` inside the archive.
///
/// OS separators become `/`, leading `/` are stripped and directories always
/// end in `/`.
///
/// ```
/// use tarsort::output::header::archive_name;
/// use std::path::Path;
///
/// assert_eq!(archive_name(Path::new("/srv/data/a.txt"), false), b"srv/data/a.txt");
/// assert_eq!(archive_name(Path::new("logs"), true), b"logs/");
/// ```
#[must_use]
pub fn archive_name(path: &Path, is_dir: bool) -> Vec<u8> {
    let raw = path.as_os_str().as_encoded_bytes();
    let mut name: Vec<u8> = if MAIN_SEPARATOR == '/' {
        raw.to_vec()
    } else {
        raw.iter()
            .map(|&b| if b == MAIN_SEPARATOR as u8 { b'/' } else { b })
            .collect()
    };
    let leading = name.iter().take_while(|&&b| b == b'/').count();
    name.drain(..leading);
    if is_dir && name.last() != Some(&b'/') {
        name.push(b'/');
    }
    name
}

fn needs_pax_name(name: &[u8]) -> bool {
    name.len() > NAME_FIELD_LEN || !name.is_ascii()
}

fn copy_truncated(field: &mut [u8; NAME_FIELD_LEN], value: &[u8]) {
    let len = value.len().min(NAME_FIELD_LEN);
    field[..len].copy_from_slice(&value[..len]);
}

#[cfg(unix)]
fn mode_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(metadata: &Metadata) -> u32 {
    if metadata.is_dir() {
        DIR_MODE
    } else {
        FILE_MODE
    }
}

/// Header type for entries that are neither files, directories nor symlinks.
#[cfg(unix)]
fn special_type(file_type: &std::fs::FileType) -> EntryType {
    use std::os::unix::fs::FileTypeExt;
    if file_type.is_fifo() {
        EntryType::Fifo
    } else if file_type.is_char_device() {
        EntryType::Char
    } else if file_type.is_block_device() {
        EntryType::Block
    } else {
        EntryType::new(b'?')
    }
}

#[cfg(not(unix))]
fn special_type(_file_type: &std::fs::FileType) -> EntryType {
    EntryType::new(b'?')
}

#[cfg(unix)]
fn owner_ids(metadata: &Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (u64::from(metadata.uid()), u64::from(metadata.gid()))
}

#[cfg(not(unix))]
fn owner_ids(_metadata: &Metadata) -> (u64, u64) {
    (0, 0)
}
