use fuser::TimeOrNow;
use nix::sys::statvfs::statvfs;
use nix::unistd::{AccessFlags, Gid, Uid};
use std::ffi::CString;
use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Filesystem statistics reported back through `statfs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FsStats {
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub bsize: u32,
    pub namelen: u32,
    pub frsize: u32,
}

impl FsStats {
    /// The record reported for synthesized directories, which have no
    /// backing filesystem.
    pub fn synthesized() -> Self {
        FsStats {
            bsize: 1,
            ..Default::default()
        }
    }
}

pub(crate) fn fs_stats(path: &Path) -> io::Result<FsStats> {
    let stat = statvfs(path)?;
    Ok(FsStats {
        blocks: stat.blocks() as u64,
        bfree: stat.blocks_free() as u64,
        bavail: stat.blocks_available() as u64,
        files: stat.files() as u64,
        ffree: stat.files_free() as u64,
        bsize: stat.block_size() as u32,
        namelen: stat.name_max() as u32,
        frsize: stat.fragment_size() as u32,
    })
}

/// Check `mask` (an `access(2)` mode) against a real path.
pub(crate) fn check_access(path: &Path, mask: i32) -> io::Result<()> {
    nix::unistd::access(path, AccessFlags::from_bits_truncate(mask))?;
    Ok(())
}

pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

pub(crate) fn set_owner(path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
    nix::unistd::chown(path, uid.map(Uid::from_raw), gid.map(Gid::from_raw))?;
    Ok(())
}

pub(crate) fn truncate(path: &Path, size: u64) -> io::Result<()> {
    OpenOptions::new().write(true).open(path)?.set_len(size)
}

/// Update access and modification times; `None` leaves a time unchanged.
pub(crate) fn set_times(
    path: &Path,
    atime: Option<TimeOrNow>,
    mtime: Option<TimeOrNow>,
) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains null byte"))?;
    let times = [to_timespec(atime), to_timespec(mtime)];

    // SAFETY: c_path is a null-terminated CString and times is a two-element
    // array, both outliving the call.
    let rc = unsafe { libc::utimensat(libc::AT_FDCWD, c_path.as_ptr(), times.as_ptr(), 0) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

fn to_timespec(time: Option<TimeOrNow>) -> libc::timespec {
    match time {
        None => libc::timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_OMIT as _,
        },
        Some(TimeOrNow::Now) => libc::timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_NOW as _,
        },
        Some(TimeOrNow::SpecificTime(t)) => {
            let since_epoch = t.duration_since(UNIX_EPOCH).unwrap_or_default();
            libc::timespec {
                tv_sec: since_epoch.as_secs() as libc::time_t,
                tv_nsec: since_epoch.subsec_nanos() as _,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[test]
    fn test_set_times() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("f");
        fs::write(&path, b"x").unwrap();

        let when = UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        set_times(&path, None, Some(TimeOrNow::SpecificTime(when))).unwrap();

        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(modified, when);
        assert!(modified < SystemTime::now());
    }

    #[test]
    fn test_set_mode_and_truncate() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("f");
        fs::write(&path, b"0123456789").unwrap();

        set_mode(&path, 0o600).unwrap();
        truncate(&path, 4).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        assert_eq!(meta.len(), 4);
    }

    #[test]
    fn test_fs_stats_of_real_directory() {
        let temp_dir = tempdir().unwrap();
        let stats = fs_stats(temp_dir.path()).unwrap();
        assert!(stats.bsize > 0);
        assert!(stats.namelen > 0);
    }

    #[test]
    fn test_synthesized_stats() {
        let stats = FsStats::synthesized();
        assert_eq!(stats.bsize, 1);
        assert_eq!(stats.blocks, 0);
        assert_eq!(stats.namelen, 0);
    }

    #[test]
    fn test_check_access_missing_file() {
        let err = check_access(Path::new("/definitely/not/here"), libc::F_OK).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    }
}
