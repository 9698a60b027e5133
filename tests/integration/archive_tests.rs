use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use tar::{Archive, EntryType};
use tarsort::output::header::archive_name;
use tarsort::output::ArchiveSink;
use tarsort::scanner::Hasher;
use tarsort::tree::{RunSummary, Tree};
use tempfile::tempdir;

#[derive(Debug)]
struct Member {
    name: String,
    entry_type: EntryType,
    link: Option<String>,
    size: u64,
    mode: u32,
    uid: u64,
    gid: u64,
    uname: String,
    gname: String,
    mtime: u64,
    content: Vec<u8>,
    pax: Vec<(String, String)>,
}

fn archive(root: &Path, hardlinks: bool) -> (Vec<u8>, RunSummary) {
    let mut tree = Tree::new(ArchiveSink::new(Vec::new(), hardlinks), Hasher::new());
    tree.scan(root).unwrap();
    tree.process().unwrap();
    let summary = tree.finish().unwrap();
    (tree.into_sink().into_inner().unwrap(), summary)
}

/// Read members back, with names made relative to `root`.
fn members(bytes: Vec<u8>, root: &Path) -> Vec<Member> {
    let prefix = String::from_utf8(archive_name(root, true)).unwrap();
    let relative = |name: String| name.strip_prefix(&prefix).map(str::to_string).unwrap_or(name);

    let mut archive = Archive::new(Cursor::new(bytes));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = String::from_utf8(entry.path_bytes().into_owned()).unwrap();
            let link = entry
                .link_name_bytes()
                .map(|l| relative(String::from_utf8(l.into_owned()).unwrap()));
            let pax = match entry.pax_extensions().unwrap() {
                Some(exts) => exts
                    .map(|e| {
                        let e = e.unwrap();
                        (
                            e.key().unwrap().to_string(),
                            e.value().unwrap().to_string(),
                        )
                    })
                    .collect(),
                None => Vec::new(),
            };
            let header = entry.header().clone();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            Member {
                name: relative(name),
                entry_type: header.entry_type(),
                link,
                size: header.size().unwrap(),
                mode: header.mode().unwrap(),
                uid: header.uid().unwrap(),
                gid: header.gid().unwrap(),
                uname: header.username().unwrap().unwrap_or_default().to_string(),
                gname: header.groupname().unwrap().unwrap_or_default().to_string(),
                mtime: header.mtime().unwrap(),
                content,
                pax,
            }
        })
        .collect()
}

fn find<'a>(members: &'a [Member], name: &str) -> &'a Member {
    members
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("no member named {name}"))
}

#[test]
fn test_identical_files_with_same_mtime_become_hardlinks() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("a.txt"), b"identical").unwrap();
    fs::write(dir.path().join("b/a.txt"), b"identical").unwrap();
    let mtime = FileTime::from_unix_time(1_700_000_000, 0);
    set_file_mtime(dir.path().join("a.txt"), mtime).unwrap();
    set_file_mtime(dir.path().join("b/a.txt"), mtime).unwrap();

    let (bytes, summary) = archive(dir.path(), true);
    let members = members(bytes, dir.path());

    let first = find(&members, "a.txt");
    assert_eq!(first.entry_type, EntryType::Regular);
    assert_eq!(first.content, b"identical");

    let second = find(&members, "b/a.txt");
    assert_eq!(second.entry_type, EntryType::Link);
    assert_eq!(second.link.as_deref(), Some("a.txt"));
    assert_eq!(second.size, 0);
    assert!(second.content.is_empty());

    assert_eq!(summary.linked, 1);
    assert_eq!(summary.bytes_stored, 9);
}

#[test]
fn test_identical_files_with_different_mtime_stay_regular() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("a.txt"), b"identical").unwrap();
    fs::write(dir.path().join("b/a.txt"), b"identical").unwrap();
    set_file_mtime(
        dir.path().join("a.txt"),
        FileTime::from_unix_time(1_700_000_000, 0),
    )
    .unwrap();
    set_file_mtime(
        dir.path().join("b/a.txt"),
        FileTime::from_unix_time(1_700_000_001, 0),
    )
    .unwrap();

    let (bytes, summary) = archive(dir.path(), true);
    let members = members(bytes, dir.path());

    for name in ["a.txt", "b/a.txt"] {
        let member = find(&members, name);
        assert_eq!(member.entry_type, EntryType::Regular);
        assert_eq!(member.content, b"identical");
    }
    assert_eq!(summary.linked, 0);
}

#[test]
fn test_no_links_without_hardlink_mode() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("x.dat"), b"same").unwrap();
    fs::write(dir.path().join("y.dat"), b"same").unwrap();
    let mtime = FileTime::from_unix_time(1_650_000_000, 0);
    set_file_mtime(dir.path().join("x.dat"), mtime).unwrap();
    set_file_mtime(dir.path().join("y.dat"), mtime).unwrap();

    let (bytes, _) = archive(dir.path(), false);
    let members = members(bytes, dir.path());

    assert!(members.iter().all(|m| m.entry_type != EntryType::Link));
    assert_eq!(find(&members, "y.dat").content, b"same");
}

#[test]
fn test_three_way_group_links_to_first_member() {
    let dir = tempdir().unwrap();
    let mtime = FileTime::from_unix_time(1_600_000_000, 0);
    for name in ["c.bin", "a.bin", "b.bin"] {
        fs::write(dir.path().join(name), b"payload").unwrap();
        set_file_mtime(dir.path().join(name), mtime).unwrap();
    }

    let (bytes, summary) = archive(dir.path(), true);
    let members = members(bytes, dir.path());

    assert_eq!(find(&members, "a.bin").entry_type, EntryType::Regular);
    assert_eq!(find(&members, "b.bin").link.as_deref(), Some("a.bin"));
    assert_eq!(find(&members, "c.bin").link.as_deref(), Some("a.bin"));
    assert_eq!(summary.linked, 2);
}

#[test]
fn test_link_target_skips_member_with_other_mtime() {
    let dir = tempdir().unwrap();
    for name in ["a.bin", "b.bin", "c.bin"] {
        fs::write(dir.path().join(name), b"payload").unwrap();
    }
    set_file_mtime(
        dir.path().join("a.bin"),
        FileTime::from_unix_time(1_000, 0),
    )
    .unwrap();
    set_file_mtime(
        dir.path().join("b.bin"),
        FileTime::from_unix_time(2_000, 0),
    )
    .unwrap();
    set_file_mtime(
        dir.path().join("c.bin"),
        FileTime::from_unix_time(2_000, 0),
    )
    .unwrap();

    let (bytes, _) = archive(dir.path(), true);
    let members = members(bytes, dir.path());

    assert_eq!(find(&members, "b.bin").entry_type, EntryType::Regular);
    assert_eq!(find(&members, "c.bin").link.as_deref(), Some("b.bin"));
}

#[test]
fn test_ownership_and_modes_are_normalized() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/run.sh"), b"#!/bin/sh\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(
            dir.path().join("sub/run.sh"),
            fs::Permissions::from_mode(0o700),
        )
        .unwrap();
        fs::set_permissions(dir.path().join("sub"), fs::Permissions::from_mode(0o700)).unwrap();
    }

    let (bytes, _) = archive(dir.path(), false);
    let members = members(bytes, dir.path());

    assert_eq!(members.len(), 3);
    for member in &members {
        assert_eq!(member.uid, 0);
        assert_eq!(member.gid, 0);
        assert_eq!(member.uname, "root");
        assert_eq!(member.gname, "wheel");
    }
    assert_eq!(find(&members, "sub/").entry_type, EntryType::Directory);
    assert_eq!(find(&members, "sub/").mode, 0o755);
    assert_eq!(find(&members, "sub/run.sh").mode, 0o644);
}

#[test]
fn test_members_are_relative_and_directories_end_in_slash() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs/readme"), b"r").unwrap();

    let (bytes, _) = archive(dir.path(), false);
    let mut archive = Archive::new(Cursor::new(bytes));
    let names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| String::from_utf8(e.unwrap().path_bytes().into_owned()).unwrap())
        .collect();

    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| !n.starts_with('/')));
    assert!(names[0].ends_with('/'));
    assert!(names[1].ends_with("docs/"));
    assert!(names[2].ends_with("docs/readme"));
}

#[test]
fn test_mtime_preserved_with_subsecond_record() {
    let dir = tempdir().unwrap();
    let whole = dir.path().join("whole.txt");
    let fraction = dir.path().join("fraction.txt");
    fs::write(&whole, b"w").unwrap();
    fs::write(&fraction, b"f").unwrap();
    set_file_mtime(&whole, FileTime::from_unix_time(1_500_000_000, 0)).unwrap();
    set_file_mtime(&fraction, FileTime::from_unix_time(1_500_000_000, 250_000_000)).unwrap();

    let (bytes, _) = archive(dir.path(), false);
    let members = members(bytes, dir.path());

    let whole = find(&members, "whole.txt");
    assert_eq!(whole.mtime, 1_500_000_000);
    assert!(whole.pax.iter().all(|(k, _)| k != "mtime"));

    let fraction = find(&members, "fraction.txt");
    assert_eq!(fraction.mtime, 1_500_000_000);
    // Some filesystems drop sub-second precision
    if let Some((_, value)) = fraction.pax.iter().find(|(k, _)| k == "mtime") {
        assert!(value.starts_with("1500000000.25"));
    }
}

#[test]
fn test_long_names_use_pax_path() {
    let dir = tempdir().unwrap();
    let long_dir = dir.path().join("d".repeat(80));
    fs::create_dir(&long_dir).unwrap();
    let long_name = format!("{}.txt", "n".repeat(60));
    fs::write(long_dir.join(&long_name), b"long").unwrap();

    let (bytes, _) = archive(dir.path(), false);
    let members = members(bytes, dir.path());

    let expected = format!("{}/{}", "d".repeat(80), long_name);
    let member = find(&members, &expected);
    assert_eq!(member.content, b"long");
    assert!(member.pax.iter().any(|(k, _)| k == "path"));
}

#[test]
fn test_long_link_target_uses_pax_linkpath() {
    let dir = tempdir().unwrap();
    let long_dir = dir.path().join("l".repeat(120));
    fs::create_dir(&long_dir).unwrap();
    let mtime = FileTime::from_unix_time(1_234_567_890, 0);
    for name in ["a.txt", "b.txt"] {
        fs::write(long_dir.join(name), b"twin").unwrap();
        set_file_mtime(long_dir.join(name), mtime).unwrap();
    }

    let (bytes, _) = archive(dir.path(), true);
    let members = members(bytes, dir.path());

    let link = find(&members, &format!("{}/b.txt", "l".repeat(120)));
    assert_eq!(link.entry_type, EntryType::Link);
    assert_eq!(
        link.link.as_deref(),
        Some(format!("{}/a.txt", "l".repeat(120)).as_str())
    );
    assert!(link.pax.iter().any(|(k, _)| k == "linkpath"));
}

#[cfg(unix)]
#[test]
fn test_inode_links_are_not_trusted() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("a.txt"), b"shared inode").unwrap();
    fs::hard_link(dir.path().join("a.txt"), dir.path().join("b/a.txt")).unwrap();

    // Without hardlink mode both names carry the full content
    let (bytes, summary) = archive(dir.path(), false);
    let members = members(bytes, dir.path());

    for name in ["a.txt", "b/a.txt"] {
        let member = find(&members, name);
        assert_eq!(member.entry_type, EntryType::Regular);
        assert_eq!(member.size, 12);
        assert_eq!(member.content, b"shared inode");
    }
    assert_eq!(summary.linked, 0);
}

#[cfg(unix)]
#[test]
fn test_inode_links_relinked_by_content() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    fs::write(dir.path().join("a.txt"), b"shared inode").unwrap();
    fs::hard_link(dir.path().join("a.txt"), dir.path().join("b/a.txt")).unwrap();

    let (bytes, summary) = archive(dir.path(), true);
    let members = members(bytes, dir.path());

    assert_eq!(find(&members, "a.txt").entry_type, EntryType::Regular);
    assert_eq!(find(&members, "b/a.txt").link.as_deref(), Some("a.txt"));
    assert_eq!(summary.linked, 1);
}

#[test]
fn test_archive_unpacks_with_links() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    let mtime = FileTime::from_unix_time(1_700_000_000, 0);
    for name in ["a.txt", "b/a.txt"] {
        fs::write(dir.path().join(name), b"unpack me").unwrap();
        set_file_mtime(dir.path().join(name), mtime).unwrap();
    }

    let (bytes, _) = archive(dir.path(), true);
    let dest = tempdir().unwrap();
    Archive::new(Cursor::new(bytes)).unpack(dest.path()).unwrap();

    let root = dest
        .path()
        .join(String::from_utf8(archive_name(dir.path(), true)).unwrap());
    assert_eq!(fs::read(root.join("a.txt")).unwrap(), b"unpack me");
    assert_eq!(fs::read(root.join("b/a.txt")).unwrap(), b"unpack me");
}

#[test]
fn test_verbose_report_lists_links() {
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let dir = tempdir().unwrap();
    let mtime = FileTime::from_unix_time(1_700_000_000, 0);
    for name in ["a.txt", "b.txt"] {
        fs::write(dir.path().join(name), b"dup").unwrap();
        set_file_mtime(dir.path().join(name), mtime).unwrap();
    }

    let report = Shared::default();
    let sink = ArchiveSink::new(Vec::new(), true).with_report(Box::new(report.clone()));
    let mut tree = Tree::new(sink, Hasher::new());
    tree.scan(dir.path()).unwrap();
    tree.process().unwrap();
    tree.finish().unwrap();

    let text = String::from_utf8(report.0.lock().unwrap().clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("{}/", dir.path().display()));
    assert_eq!(lines[1], a.display().to_string());
    assert_eq!(lines[2], format!("{} -> {}", b.display(), a.display()));
}
