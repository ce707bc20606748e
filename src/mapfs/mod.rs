//! FUSE filesystem serving the live namespace.
//!
//! Every operation resolves its virtual path against a fresh snapshot from
//! the [`ReloadCoordinator`], so a reload becomes visible to the next
//! operation without remounting. Leaves are served straight from their real
//! paths; synthesized directories are read-only.

mod convert;
mod file_handle;
mod helpers;
mod inode_table;
pub mod mount;

pub use mount::{mount_mapper, unmount_mapper, MountHandle};

use convert::{
    directory_attr, io_error_to_libc, metadata_to_fileattr, metadata_to_filetype,
    std_filetype_to_fuser,
};
use file_handle::{FileHandle, READ_BUFFER};
use helpers::FsStats;
use inode_table::InodeTable;

use fuser::{
    fuse_forget_one, FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate,
    ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite,
    Request, TimeOrNow, FUSE_ROOT_ID,
};
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::namespace::path::{join, split};
use crate::namespace::{NamespaceIndex, ReloadCoordinator, ResolvedTarget};

pub struct MapperFs {
    coordinator: Arc<ReloadCoordinator>,
    inodes: RwLock<InodeTable>,
    /// Reload generation the inode table was last pruned against.
    pruned_generation: Mutex<u64>,
    file_handles: RwLock<FxHashMap<u64, FileHandle>>,
    next_fh: Mutex<u64>,
    /// Attribute and entry cache timeout. Higher values delay the point at
    /// which the kernel notices a reload.
    ttl: Duration,
    uid: u32,
    gid: u32,
}

impl MapperFs {
    pub fn new(coordinator: Arc<ReloadCoordinator>, ttl_secs: u64) -> Self {
        let generation = coordinator.generation();
        MapperFs {
            coordinator,
            pruned_generation: Mutex::new(generation),
            inodes: RwLock::new(InodeTable::new()),
            file_handles: RwLock::new(FxHashMap::default()),
            next_fh: Mutex::new(1),
            ttl: Duration::from_secs(ttl_secs),
            uid: nix::unistd::geteuid().as_raw(),
            gid: nix::unistd::getegid().as_raw(),
        }
    }

    fn alloc_fh(&self) -> u64 {
        let mut next = self.next_fh.lock();
        let fh = *next;
        *next = next.wrapping_add(1);
        fh
    }

    fn path_of(&self, ino: u64) -> Option<String> {
        self.inodes.read().path(ino).map(str::to_string)
    }

    fn ino_for(&self, path: &str) -> u64 {
        if let Some(ino) = self.inodes.read().get(path) {
            return ino;
        }
        self.inodes.write().assign(path)
    }

    /// After a reload, drop inodes the kernel holds no reference to and whose
    /// paths no longer exist in the namespace.
    fn prune_stale_inodes(&self) {
        let generation = self.coordinator.generation();
        {
            let mut pruned = self.pruned_generation.lock();
            if *pruned == generation {
                return;
            }
            *pruned = generation;
        }

        let snapshot = self.coordinator.snapshot();
        let candidates = self.inodes.read().unreferenced();
        let stale: Vec<u64> = candidates
            .into_iter()
            .filter(|(_, path)| snapshot.resolve(path).is_err())
            .map(|(ino, _)| ino)
            .collect();
        if stale.is_empty() {
            return;
        }

        let mut inodes = self.inodes.write();
        let removed = stale
            .into_iter()
            .filter(|ino| inodes.remove_unreferenced(*ino))
            .count();
        tracing::debug!("pruned {} stale inodes, {} remain", removed, inodes.len());
    }

    /// Virtual path of `name` inside directory `parent`. Virtual paths are
    /// UTF-8, so other names cannot exist in the namespace.
    fn child_path(&self, parent: u64, name: &OsStr) -> Result<String, i32> {
        let parent_path = self.path_of(parent).ok_or(libc::ENOENT)?;
        let name = name.to_str().ok_or(libc::ENOENT)?;
        Ok(join(&parent_path, name))
    }

    fn attr_of(&self, snapshot: &NamespaceIndex, vpath: &str, ino: u64) -> Result<FileAttr, i32> {
        match snapshot.resolve(vpath).map_err(|e| e.errno())? {
            ResolvedTarget::Leaf(real) => fs::symlink_metadata(&real)
                .map(|meta| metadata_to_fileattr(&meta, ino))
                .map_err(|e| io_error_to_libc(&e)),
            ResolvedTarget::Directory(node) => Ok(directory_attr(
                node,
                ino,
                snapshot.created(),
                self.uid,
                self.gid,
            )),
        }
    }

    /// Real path behind `ino`, or `EACCES` for a synthesized directory.
    fn writable_path(&self, ino: u64) -> Result<PathBuf, i32> {
        let vpath = self.path_of(ino).ok_or(libc::ENOENT)?;
        let snapshot = self.coordinator.snapshot();
        let target = snapshot.resolve(&vpath).map_err(|e| e.errno())?;
        target
            .ensure_writable(&vpath)
            .map(Path::to_path_buf)
            .map_err(|e| e.errno())
    }

    fn handle(&self, fh: u64) -> Option<Arc<Mutex<File>>> {
        self.file_handles
            .read()
            .get(&fh)
            .map(|h| Arc::clone(&h.file))
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_setattr(
        &self,
        real: &Path,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        fh: Option<u64>,
    ) -> std::io::Result<()> {
        if let Some(mode) = mode {
            helpers::set_mode(real, mode)?;
        }
        if uid.is_some() || gid.is_some() {
            helpers::set_owner(real, uid, gid)?;
        }
        if let Some(size) = size {
            match fh.and_then(|fh| self.handle(fh)) {
                Some(file) => file.lock().set_len(size)?,
                None => helpers::truncate(real, size)?,
            }
        }
        if atime.is_some() || mtime.is_some() {
            helpers::set_times(real, atime, mtime)?;
        }
        Ok(())
    }

    /// Entries of the directory at `vpath`, `.` and `..` first.
    fn list_directory(&self, vpath: &str, ino: u64) -> Result<Vec<(u64, FileType, String)>, i32> {
        self.prune_stale_inodes();
        let snapshot = self.coordinator.snapshot();
        let mut children: Vec<(String, String, FileType)> = Vec::new();

        match snapshot.resolve(vpath).map_err(|e| e.errno())? {
            ResolvedTarget::Directory(node) => {
                for name in node.children() {
                    let child = join(vpath, name);
                    let kind = match snapshot.real_path(&child) {
                        Some(real) => fs::symlink_metadata(real)
                            .map(|meta| metadata_to_filetype(&meta))
                            .unwrap_or(FileType::RegularFile),
                        None => FileType::Directory,
                    };
                    children.push((child, name.to_string(), kind));
                }
            }
            ResolvedTarget::Leaf(real) => {
                let read_dir = fs::read_dir(&real).map_err(|e| io_error_to_libc(&e))?;
                for entry in read_dir.flatten() {
                    let file_name = entry.file_name();
                    let Some(name) = file_name.to_str() else {
                        tracing::debug!("readdir: skipping non-UTF-8 name {:?}", file_name);
                        continue;
                    };
                    let kind = entry
                        .file_type()
                        .map(std_filetype_to_fuser)
                        .unwrap_or(FileType::RegularFile);
                    children.push((join(vpath, name), name.to_string(), kind));
                }
                children.sort_by(|a, b| a.1.cmp(&b.1));
            }
        }

        let parent_ino = if ino == FUSE_ROOT_ID {
            FUSE_ROOT_ID
        } else {
            self.ino_for(split(vpath).0)
        };

        let mut entries = Vec::with_capacity(children.len() + 2);
        entries.push((ino, FileType::Directory, ".".to_string()));
        entries.push((parent_ino, FileType::Directory, "..".to_string()));

        // Assign all new inodes under one write lock
        let mut inodes = self.inodes.write();
        for (child, name, kind) in children {
            entries.push((inodes.assign(&child), kind, name));
        }
        Ok(entries)
    }
}

impl Filesystem for MapperFs {
    fn init(
        &mut self,
        _req: &Request,
        _config: &mut KernelConfig,
    ) -> std::result::Result<(), libc::c_int> {
        let snapshot = self.coordinator.snapshot();
        tracing::info!(
            "mapperfs initialized with {} entries ({} strategy)",
            snapshot.entry_count(),
            self.coordinator.strategy()
        );
        Ok(())
    }

    fn destroy(&mut self) {
        tracing::info!("mapperfs destroyed");
    }

    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        tracing::debug!("lookup(parent={}, name={:?})", parent, name);

        let vpath = match self.child_path(parent, name) {
            Ok(p) => p,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        self.prune_stale_inodes();
        let snapshot = self.coordinator.snapshot();
        // Check existence before allocating an inode for the name
        if let Err(e) = snapshot.resolve(&vpath) {
            tracing::trace!("lookup: {}", e);
            reply.error(e.errno());
            return;
        }

        // A successful reply hands the kernel a reference that `forget` returns
        let ino = self.inodes.write().lookup(&vpath);
        match self.attr_of(&snapshot, &vpath, ino) {
            Ok(attr) => reply.entry(&self.ttl, &attr, 0),
            Err(errno) => {
                self.inodes.write().forget(ino, 1);
                reply.error(errno)
            }
        }
    }

    fn forget(&mut self, _req: &Request, ino: u64, nlookup: u64) {
        tracing::trace!("forget(ino={}, nlookup={})", ino, nlookup);
        self.inodes.write().forget(ino, nlookup);
    }

    fn batch_forget(&mut self, _req: &Request, nodes: &[fuse_forget_one]) {
        tracing::trace!("batch_forget({} inodes)", nodes.len());
        let mut inodes = self.inodes.write();
        for node in nodes {
            inodes.forget(node.nodeid, node.nlookup);
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        tracing::trace!("getattr(ino={})", ino);
        let Some(vpath) = self.path_of(ino) else {
            tracing::warn!("getattr: inode {} not found", ino);
            reply.error(libc::ENOENT);
            return;
        };

        let snapshot = self.coordinator.snapshot();
        match self.attr_of(&snapshot, &vpath, ino) {
            Ok(attr) => reply.attr(&self.ttl, &attr),
            Err(errno) => reply.error(errno),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        tracing::debug!(
            "setattr(ino={}, mode={:?}, uid={:?}, gid={:?}, size={:?})",
            ino,
            mode,
            uid,
            gid,
            size
        );

        let real = match self.writable_path(ino) {
            Ok(p) => p,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        if let Err(e) = self.apply_setattr(&real, mode, uid, gid, size, atime, mtime, fh) {
            tracing::debug!("setattr: {} failed: {}", real.display(), e);
            reply.error(io_error_to_libc(&e));
            return;
        }

        match fs::symlink_metadata(&real) {
            Ok(meta) => reply.attr(&self.ttl, &metadata_to_fileattr(&meta, ino)),
            Err(e) => reply.error(io_error_to_libc(&e)),
        }
    }

    fn readlink(&mut self, _req: &Request, ino: u64, reply: ReplyData) {
        let Some(vpath) = self.path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        let snapshot = self.coordinator.snapshot();
        match snapshot.resolve(&vpath) {
            Ok(ResolvedTarget::Leaf(real)) => match fs::read_link(&real) {
                Ok(target) => reply.data(target.as_os_str().as_bytes()),
                Err(e) => reply.error(io_error_to_libc(&e)),
            },
            Ok(ResolvedTarget::Directory(_)) => reply.error(libc::EINVAL),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn mknod(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        tracing::debug!("mknod(parent={}, name={:?}) denied", parent, name);
        reply.error(libc::EACCES);
    }

    fn mkdir(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        tracing::debug!("mkdir(parent={}, name={:?}) denied", parent, name);
        reply.error(libc::EACCES);
    }

    fn unlink(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        tracing::debug!("unlink(parent={}, name={:?}) denied", parent, name);
        reply.error(libc::EACCES);
    }

    fn rmdir(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        tracing::debug!("rmdir(parent={}, name={:?}) denied", parent, name);
        reply.error(libc::EACCES);
    }

    fn symlink(
        &mut self,
        _req: &Request,
        parent: u64,
        link_name: &OsStr,
        _target: &Path,
        reply: ReplyEntry,
    ) {
        tracing::debug!("symlink(parent={}, name={:?}) denied", parent, link_name);
        reply.error(libc::EACCES);
    }

    fn rename(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        tracing::debug!("rename(parent={}, name={:?}) denied", parent, name);
        reply.error(libc::EACCES);
    }

    fn link(
        &mut self,
        _req: &Request,
        ino: u64,
        _newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        tracing::debug!("link(ino={}, newname={:?}) denied", ino, newname);
        reply.error(libc::EACCES);
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        tracing::debug!("open(ino={}, flags={:#x})", ino, flags);

        let real = match self.writable_path(ino) {
            Ok(p) => p,
            Err(libc::EACCES) => {
                reply.error(libc::EISDIR);
                return;
            }
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        // O_RDONLY is 0, so anything else asks for write access
        let access_mode = flags & libc::O_ACCMODE;
        let wants_read = access_mode != libc::O_WRONLY;
        let wants_write = access_mode != libc::O_RDONLY;

        let file = match File::options()
            .read(wants_read)
            .write(wants_write)
            .truncate(wants_write && (flags & libc::O_TRUNC != 0))
            .append(wants_write && (flags & libc::O_APPEND != 0))
            .open(&real)
        {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!("open: {} failed: {}", real.display(), e);
                reply.error(io_error_to_libc(&e));
                return;
            }
        };

        let fh = self.alloc_fh();
        self.file_handles.write().insert(fh, FileHandle::new(file));
        reply.opened(fh, 0);
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        tracing::debug!(
            "read(ino={}, fh={}, offset={}, size={})",
            ino,
            fh,
            offset,
            size
        );
        // Clone the handle so the table lock is not held during I/O
        let Some(file_arc) = self.handle(fh) else {
            tracing::warn!("read: file handle {} not found", fh);
            reply.error(libc::EBADF);
            return;
        };
        let mut file = file_arc.lock();

        READ_BUFFER.with(|buffer| {
            let mut buf = buffer.borrow_mut();
            buf.resize(size as usize, 0u8);

            if let Err(e) = std::io::Seek::seek(&mut *file, std::io::SeekFrom::Start(offset as u64)) {
                tracing::error!("read: seek failed - {}", e);
                reply.error(io_error_to_libc(&e));
                return;
            }

            match std::io::Read::read(&mut *file, &mut buf[..]) {
                Ok(n) => reply.data(&buf[..n]),
                Err(e) => {
                    tracing::error!("read: read failed - {}", e);
                    reply.error(io_error_to_libc(&e));
                }
            }
        });
    }

    fn write(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        tracing::debug!(
            "write(ino={}, fh={}, offset={}, len={})",
            ino,
            fh,
            offset,
            data.len()
        );

        let Some(file_arc) = self.handle(fh) else {
            reply.error(libc::EBADF);
            return;
        };
        let mut file = file_arc.lock();

        if let Err(e) = std::io::Seek::seek(&mut *file, std::io::SeekFrom::Start(offset as u64)) {
            tracing::error!("write: seek failed - {}", e);
            reply.error(io_error_to_libc(&e));
            return;
        }

        match std::io::Write::write(&mut *file, data) {
            Ok(n) => reply.written(n as u32),
            Err(e) => {
                tracing::error!("write: write failed - {}", e);
                reply.error(io_error_to_libc(&e));
            }
        }
    }

    fn flush(&mut self, _req: &Request, ino: u64, fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        tracing::trace!("flush(ino={}, fh={})", ino, fh);
        let Some(file_arc) = self.handle(fh) else {
            reply.error(libc::EBADF);
            return;
        };

        let result = std::io::Write::flush(&mut *file_arc.lock());
        match result {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(io_error_to_libc(&e)),
        }
    }

    fn fsync(&mut self, _req: &Request, ino: u64, fh: u64, datasync: bool, reply: ReplyEmpty) {
        tracing::debug!("fsync(ino={}, fh={}, datasync={})", ino, fh, datasync);
        let Some(file_arc) = self.handle(fh) else {
            reply.error(libc::EBADF);
            return;
        };

        let file = file_arc.lock();
        let result = if datasync {
            file.sync_data()
        } else {
            file.sync_all()
        };
        match result {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(io_error_to_libc(&e)),
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        self.file_handles.write().remove(&fh);
        reply.ok();
    }

    fn opendir(&mut self, _req: &Request, ino: u64, _flags: i32, reply: ReplyOpen) {
        tracing::debug!("opendir(ino={})", ino);
        let Some(vpath) = self.path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        let snapshot = self.coordinator.snapshot();
        match snapshot.resolve(&vpath) {
            Ok(ResolvedTarget::Directory(_)) => reply.opened(0, 0),
            Ok(ResolvedTarget::Leaf(real)) => match fs::metadata(&real) {
                Ok(meta) if meta.is_dir() => reply.opened(0, 0),
                Ok(_) => reply.error(libc::ENOTDIR),
                Err(e) => reply.error(io_error_to_libc(&e)),
            },
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        tracing::debug!("readdir(ino={}, offset={})", ino, offset);
        let Some(vpath) = self.path_of(ino) else {
            tracing::warn!("readdir: inode {} not found", ino);
            reply.error(libc::ENOENT);
            return;
        };

        let entries = match self.list_directory(&vpath, ino) {
            Ok(entries) => entries,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        for (idx, (child_ino, file_type, name)) in
            entries.iter().enumerate().skip(offset.max(0) as usize)
        {
            if reply.add(*child_ino, (idx + 1) as i64, *file_type, name) {
                break;
            }
        }
        reply.ok();
    }

    fn releasedir(&mut self, _req: &Request, _ino: u64, _fh: u64, _flags: i32, reply: ReplyEmpty) {
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request, ino: u64, reply: ReplyStatfs) {
        tracing::debug!("statfs(ino={})", ino);
        let vpath = self.path_of(ino).unwrap_or_else(|| "/".to_string());
        let snapshot = self.coordinator.snapshot();

        let stats = match snapshot.resolve(&vpath) {
            Ok(ResolvedTarget::Leaf(real)) => match helpers::fs_stats(&real) {
                Ok(stats) => stats,
                Err(e) => {
                    reply.error(io_error_to_libc(&e));
                    return;
                }
            },
            Ok(ResolvedTarget::Directory(_)) => FsStats::synthesized(),
            Err(e) => {
                reply.error(e.errno());
                return;
            }
        };

        reply.statfs(
            stats.blocks,
            stats.bfree,
            stats.bavail,
            stats.files,
            stats.ffree,
            stats.bsize,
            stats.namelen,
            stats.frsize,
        );
    }

    fn access(&mut self, _req: &Request, ino: u64, mask: i32, reply: ReplyEmpty) {
        tracing::trace!("access(ino={}, mask={:#o})", ino, mask);
        let Some(vpath) = self.path_of(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        let snapshot = self.coordinator.snapshot();
        match snapshot.resolve(&vpath) {
            Ok(ResolvedTarget::Directory(_)) if mask & libc::W_OK != 0 => {
                reply.error(libc::EACCES)
            }
            Ok(ResolvedTarget::Directory(_)) => reply.ok(),
            Ok(ResolvedTarget::Leaf(real)) => match helpers::check_access(&real, mask) {
                Ok(()) => reply.ok(),
                Err(e) => reply.error(io_error_to_libc(&e)),
            },
            Err(e) => reply.error(e.errno()),
        }
    }

    fn create(
        &mut self,
        _req: &Request,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        tracing::debug!("create(parent={}, name={:?}) denied", parent, name);
        reply.error(libc::EACCES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::{Entry, ProjectionStrategy};
    use tempfile::tempdir;

    fn mapper_fs(entries: Vec<Entry>) -> MapperFs {
        let coordinator = Arc::new(ReloadCoordinator::new(ProjectionStrategy::Identity));
        coordinator.reload_entries(entries);
        MapperFs::new(coordinator, 1)
    }

    #[test]
    fn test_child_path_and_inodes() {
        let mapper = mapper_fs(vec![Entry::new("/a/b", "/real/b")]);

        let a = mapper.child_path(FUSE_ROOT_ID, OsStr::new("a")).unwrap();
        assert_eq!(a, "/a");
        let ino = mapper.ino_for(&a);
        assert_eq!(mapper.child_path(ino, OsStr::new("b")).unwrap(), "/a/b");
        assert_eq!(mapper.ino_for("/a"), ino);
        assert_eq!(mapper.child_path(999, OsStr::new("x")), Err(libc::ENOENT));
    }

    #[test]
    fn test_attr_of_directory_and_leaf() {
        let temp_dir = tempdir().unwrap();
        let real = temp_dir.path().join("song.mp3");
        fs::write(&real, b"abc").unwrap();

        let mapper = mapper_fs(vec![Entry::new("/music/song.mp3", real.to_str().unwrap())]);
        let snapshot = mapper.coordinator.snapshot();

        let dir = mapper.attr_of(&snapshot, "/music", 5).unwrap();
        assert_eq!(dir.kind, FileType::Directory);
        assert_eq!(dir.perm, 0o555);
        assert_eq!(dir.size, 1);
        assert_eq!(dir.uid, mapper.uid);

        let leaf = mapper.attr_of(&snapshot, "/music/song.mp3", 6).unwrap();
        assert_eq!(leaf.kind, FileType::RegularFile);
        assert_eq!(leaf.size, 3);

        assert_eq!(mapper.attr_of(&snapshot, "/nope", 7), Err(libc::ENOENT));
    }

    #[test]
    fn test_synthesized_directory_is_not_writable() {
        let mapper = mapper_fs(vec![Entry::new("/a/b", "/real/b")]);
        let ino = mapper.ino_for("/a");
        assert_eq!(mapper.writable_path(ino), Err(libc::EACCES));

        let leaf = mapper.ino_for("/a/b");
        assert_eq!(mapper.writable_path(leaf), Ok(PathBuf::from("/real/b")));
    }

    #[test]
    fn test_list_synthesized_directory() {
        let mapper = mapper_fs(vec![
            Entry::new("/shells/zsh", "/bin/zsh"),
            Entry::new("/shells/more/fish", "/usr/bin/fish"),
        ]);
        let ino = mapper.ino_for("/shells");

        let entries = mapper.list_directory("/shells", ino).unwrap();
        let names: Vec<&str> = entries.iter().map(|(_, _, n)| n.as_str()).collect();
        assert_eq!(names, vec![".", "..", "more", "zsh"]);
        assert_eq!(entries[0].0, ino);
        assert_eq!(entries[1].0, FUSE_ROOT_ID);
        assert_eq!(entries[2].1, FileType::Directory);
        assert_eq!(entries[2].0, mapper.ino_for("/shells/more"));
    }

    #[test]
    fn test_list_real_directory_beneath_entry() {
        let temp_dir = tempdir().unwrap();
        let music = temp_dir.path().join("music");
        fs::create_dir_all(music.join("album")).unwrap();
        fs::write(music.join("b.mp3"), b"b").unwrap();
        fs::write(music.join("a.mp3"), b"a").unwrap();

        let mapper = mapper_fs(vec![Entry::new("/music", music.to_str().unwrap())]);
        let ino = mapper.ino_for("/music");

        let entries = mapper.list_directory("/music", ino).unwrap();
        let listed: Vec<(&str, FileType)> = entries
            .iter()
            .skip(2)
            .map(|(_, kind, name)| (name.as_str(), *kind))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("a.mp3", FileType::RegularFile),
                ("album", FileType::Directory),
                ("b.mp3", FileType::RegularFile)
            ]
        );
        assert!(mapper.inodes.read().get("/music/album").is_some());
    }

    #[test]
    fn test_stale_inodes_pruned_after_reload() {
        let mapper = mapper_fs(vec![Entry::new("/gen0/file.txt", "/real/gen0")]);
        let held = mapper.inodes.write().lookup("/gen0");

        for generation in 1..=100 {
            let entries = (0..10)
                .map(|i| {
                    Entry::new(
                        format!("/gen{}/file{}.txt", generation, i),
                        format!("/real/{}/{}", generation, i),
                    )
                })
                .collect();
            mapper.coordinator.reload_entries(entries);

            let dir = format!("/gen{}", generation);
            let ino = mapper.ino_for(&dir);
            mapper.list_directory(&dir, ino).unwrap();
        }

        // Root, the last generation's directory and its ten files, plus the
        // inode the kernel still references
        assert_eq!(mapper.inodes.read().len(), 13);
        assert_eq!(mapper.path_of(held).as_deref(), Some("/gen0"));

        mapper.inodes.write().forget(held, 1);
        assert_eq!(mapper.path_of(held), None);
    }

    #[test]
    fn test_reload_is_visible_to_next_lookup() {
        let mapper = mapper_fs(vec![Entry::new("/one", "/real/one")]);
        let ino = mapper.ino_for("/one");
        assert!(mapper.writable_path(ino).is_ok());

        mapper.coordinator
            .reload_entries(vec![Entry::new("/two", "/real/two")]);
        assert_eq!(mapper.writable_path(ino), Err(libc::ENOENT));
    }
}
