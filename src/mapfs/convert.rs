use fuser::{FileAttr, FileType};
use libc::S_IFMT;
use std::fs::Metadata;
use std::io;
use std::os::unix::prelude::MetadataExt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::namespace::DirectoryNode;

/// Permission bits of every synthesized directory.
pub(crate) const SYNTHESIZED_DIR_PERM: u16 = 0o555;

/// Map std::io::Error to a libc error code, preferring the raw OS error.
pub(crate) fn io_error_to_libc(e: &io::Error) -> i32 {
    if let Some(code) = e.raw_os_error() {
        return code;
    }

    match e.kind() {
        io::ErrorKind::NotFound => libc::ENOENT,
        io::ErrorKind::PermissionDenied => libc::EACCES,
        io::ErrorKind::AlreadyExists => libc::EEXIST,
        io::ErrorKind::InvalidInput => libc::EINVAL,
        io::ErrorKind::InvalidData => libc::EINVAL,
        io::ErrorKind::TimedOut => libc::ETIMEDOUT,
        io::ErrorKind::Interrupted => libc::EINTR,
        io::ErrorKind::WriteZero => libc::ENOSPC,
        io::ErrorKind::OutOfMemory => libc::ENOMEM,
        io::ErrorKind::BrokenPipe => libc::EPIPE,
        io::ErrorKind::WouldBlock => libc::EAGAIN,
        io::ErrorKind::Unsupported => libc::ENOTSUP,
        _ => libc::EIO,
    }
}

pub(crate) fn metadata_to_filetype(meta: &Metadata) -> FileType {
    match meta.mode() & (S_IFMT as u32) {
        x if x == libc::S_IFREG as u32 => FileType::RegularFile,
        x if x == libc::S_IFDIR as u32 => FileType::Directory,
        x if x == libc::S_IFLNK as u32 => FileType::Symlink,
        x if x == libc::S_IFBLK as u32 => FileType::BlockDevice,
        x if x == libc::S_IFCHR as u32 => FileType::CharDevice,
        x if x == libc::S_IFIFO as u32 => FileType::NamedPipe,
        x if x == libc::S_IFSOCK as u32 => FileType::Socket,
        _ => FileType::RegularFile,
    }
}

/// Convert std::fs::FileType to fuser FileType without another stat call.
pub(crate) fn std_filetype_to_fuser(ft: std::fs::FileType) -> FileType {
    use std::os::unix::fs::FileTypeExt;

    if ft.is_file() {
        FileType::RegularFile
    } else if ft.is_dir() {
        FileType::Directory
    } else if ft.is_symlink() {
        FileType::Symlink
    } else if ft.is_block_device() {
        FileType::BlockDevice
    } else if ft.is_char_device() {
        FileType::CharDevice
    } else if ft.is_fifo() {
        FileType::NamedPipe
    } else if ft.is_socket() {
        FileType::Socket
    } else {
        FileType::RegularFile
    }
}

pub(crate) fn metadata_to_fileattr(meta: &Metadata, ino: u64) -> FileAttr {
    FileAttr {
        ino,
        size: meta.len(),
        blocks: meta.blocks(),
        atime: meta.accessed().unwrap_or(UNIX_EPOCH),
        mtime: meta.modified().unwrap_or(UNIX_EPOCH),
        ctime: ctime(meta),
        crtime: meta.created().unwrap_or(UNIX_EPOCH),
        kind: metadata_to_filetype(meta),
        perm: (meta.mode() & 0o7777) as u16,
        nlink: meta.nlink() as u32,
        uid: meta.uid(),
        gid: meta.gid(),
        rdev: meta.rdev() as u32,
        blksize: meta.blksize() as u32,
        flags: 0,
    }
}

/// Attributes of a synthesized directory. Size is its child count and every
/// timestamp is the snapshot's build time.
pub(crate) fn directory_attr(
    node: &DirectoryNode,
    ino: u64,
    created: SystemTime,
    uid: u32,
    gid: u32,
) -> FileAttr {
    FileAttr {
        ino,
        size: node.len() as u64,
        blocks: 0,
        atime: created,
        mtime: created,
        ctime: created,
        crtime: created,
        kind: FileType::Directory,
        perm: SYNTHESIZED_DIR_PERM,
        nlink: node.nlink(),
        uid,
        gid,
        rdev: 0,
        blksize: 512,
        flags: 0,
    }
}

fn ctime(meta: &Metadata) -> SystemTime {
    let secs = meta.ctime();
    let nanos = meta.ctime_nsec().clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        UNIX_EPOCH + std::time::Duration::new(secs as u64, nanos)
    } else {
        UNIX_EPOCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{Entry, NamespaceIndex};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_io_error_prefers_raw_os_error() {
        let err = io::Error::from_raw_os_error(libc::ENOTDIR);
        assert_eq!(io_error_to_libc(&err), libc::ENOTDIR);

        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(io_error_to_libc(&err), libc::ENOENT);

        let err = io::Error::new(io::ErrorKind::Other, "odd");
        assert_eq!(io_error_to_libc(&err), libc::EIO);
    }

    #[test]
    fn test_metadata_to_fileattr_regular_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("song.mp3");
        fs::write(&path, b"12345").unwrap();

        let meta = fs::symlink_metadata(&path).unwrap();
        let attr = metadata_to_fileattr(&meta, 42);
        assert_eq!(attr.ino, 42);
        assert_eq!(attr.size, 5);
        assert_eq!(attr.kind, FileType::RegularFile);
        assert_eq!(attr.uid, meta.uid());
    }

    #[test]
    fn test_symlink_is_not_followed() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        fs::write(&target, b"x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let meta = fs::symlink_metadata(&link).unwrap();
        assert_eq!(metadata_to_filetype(&meta), FileType::Symlink);
        assert_eq!(
            std_filetype_to_fuser(meta.file_type()),
            FileType::Symlink
        );
    }

    #[test]
    fn test_directory_attr() {
        let index = NamespaceIndex::build(vec![
            Entry::new("/a/x", "/real/x"),
            Entry::new("/a/sub/y", "/real/y"),
        ]);
        let node = index.directory("/a").unwrap();

        let attr = directory_attr(node, 7, index.created(), 1000, 100);
        assert_eq!(attr.kind, FileType::Directory);
        assert_eq!(attr.perm, 0o555);
        assert_eq!(attr.size, 2);
        assert_eq!(attr.nlink, 3);
        assert_eq!(attr.mtime, index.created());
        assert_eq!(attr.ctime, index.created());
        assert_eq!((attr.uid, attr.gid), (1000, 100));
    }
}
