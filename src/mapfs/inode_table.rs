use fuser::FUSE_ROOT_ID;
use fxhash::FxHashMap;

use crate::namespace::path::ROOT;

/// Stable inode numbers for virtual paths.
///
/// The kernel addresses files by inode while the namespace is addressed by
/// path. Each virtual path gets a number the first time it is seen and keeps
/// it for as long as the kernel references it, so a file that survives a
/// reload is still the same file to the kernel. Numbers are never reused.
///
/// Every number handed out through `lookup` carries a reference count that
/// `forget` gives back. Numbers with no references (forgotten ones, or ones
/// only ever reported by `readdir`) may be dropped at any time.
#[derive(Debug)]
pub(crate) struct InodeTable {
    by_path: FxHashMap<String, u64>,
    slots: FxHashMap<u64, InodeSlot>,
    next_ino: u64,
}

#[derive(Debug)]
struct InodeSlot {
    path: String,
    lookups: u64,
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = InodeTable {
            by_path: FxHashMap::default(),
            slots: FxHashMap::default(),
            // Inode 1 (FUSE_ROOT_ID) is the root directory
            next_ino: FUSE_ROOT_ID + 1,
        };
        table.by_path.insert(ROOT.to_string(), FUSE_ROOT_ID);
        table.slots.insert(
            FUSE_ROOT_ID,
            InodeSlot {
                path: ROOT.to_string(),
                lookups: 0,
            },
        );
        table
    }

    pub fn path(&self, ino: u64) -> Option<&str> {
        self.slots.get(&ino).map(|slot| slot.path.as_str())
    }

    pub fn get(&self, path: &str) -> Option<u64> {
        self.by_path.get(path).copied()
    }

    /// Inode for `path`, allocating one if the path is new. Does not add a
    /// kernel reference.
    pub fn assign(&mut self, path: &str) -> u64 {
        if let Some(ino) = self.by_path.get(path) {
            return *ino;
        }
        let ino = self.next_ino;
        self.next_ino = self.next_ino.wrapping_add(1);
        self.by_path.insert(path.to_string(), ino);
        self.slots.insert(
            ino,
            InodeSlot {
                path: path.to_string(),
                lookups: 0,
            },
        );
        ino
    }

    /// Inode for `path` with one more kernel reference, as for a successful
    /// `lookup` reply.
    pub fn lookup(&mut self, path: &str) -> u64 {
        let ino = self.assign(path);
        if let Some(slot) = self.slots.get_mut(&ino) {
            slot.lookups = slot.lookups.saturating_add(1);
        }
        ino
    }

    /// Drop `nlookup` kernel references. Returns true if the inode was
    /// removed. The root is never removed.
    pub fn forget(&mut self, ino: u64, nlookup: u64) -> bool {
        let Some(slot) = self.slots.get_mut(&ino) else {
            return false;
        };
        slot.lookups = slot.lookups.saturating_sub(nlookup);
        if slot.lookups == 0 && ino != FUSE_ROOT_ID {
            self.remove(ino);
            return true;
        }
        false
    }

    /// Inodes the kernel holds no reference to, excluding the root.
    pub fn unreferenced(&self) -> Vec<(u64, String)> {
        self.slots
            .iter()
            .filter(|(ino, slot)| slot.lookups == 0 && **ino != FUSE_ROOT_ID)
            .map(|(ino, slot)| (*ino, slot.path.clone()))
            .collect()
    }

    /// Remove `ino` if it is still unreferenced.
    pub fn remove_unreferenced(&mut self, ino: u64) -> bool {
        match self.slots.get(&ino) {
            Some(slot) if slot.lookups == 0 && ino != FUSE_ROOT_ID => {
                self.remove(ino);
                true
            }
            _ => false,
        }
    }

    fn remove(&mut self, ino: u64) {
        if let Some(slot) = self.slots.remove(&ino) {
            self.by_path.remove(&slot.path);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
