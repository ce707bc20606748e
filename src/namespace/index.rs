use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use crate::namespace::path::{normalize, trim_real, ROOT};
use crate::namespace::synth::{synthesize, DirectoryNode, NamespaceConflict};

/// One mapping from a virtual path to a real path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    virtual_path: String,
    real_path: String,
}

impl Entry {
    /// Build an entry, normalizing trailing separators on both sides and
    /// giving the virtual path a leading `/`.
    pub fn new(virtual_path: impl AsRef<str>, real_path: impl AsRef<str>) -> Self {
        Entry {
            virtual_path: normalize(virtual_path.as_ref()),
            real_path: trim_real(real_path.as_ref()),
        }
    }

    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    pub fn real_path(&self) -> &str {
        &self.real_path
    }
}

/// An immutable snapshot of the virtual namespace.
///
/// Built once from a complete entry set and never modified afterwards;
/// reloading produces a new index instead.
#[derive(Debug)]
pub struct NamespaceIndex {
    entries: HashMap<String, String>,
    dirs: HashMap<String, DirectoryNode>,
    conflicts: Vec<NamespaceConflict>,
    created: SystemTime,
}

impl NamespaceIndex {
    /// Build an index from entries. When two entries share a virtual path the
    /// later one wins.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut map: HashMap<String, String> = HashMap::new();
        for entry in entries {
            if let Some(previous) = map.insert(entry.virtual_path, entry.real_path) {
                tracing::debug!("virtual path mapped twice, dropping {}", previous);
            }
        }

        let virtual_paths: HashSet<String> = map.keys().cloned().collect();
        let synthesis = synthesize(&virtual_paths);
        let mut dirs = synthesis.dirs;

        if !map.contains_key(ROOT) {
            dirs.entry(ROOT.to_string()).or_default();
        }

        for conflict in &synthesis.conflicts {
            tracing::warn!(
                "entry {} is nested under entry {}; {} is served from its real path",
                conflict.nested,
                conflict.entry,
                conflict.entry
            );
        }

        tracing::debug!("init with {} entries, {} directories", map.len(), dirs.len());

        NamespaceIndex {
            entries: map,
            dirs,
            conflicts: synthesis.conflicts,
            created: SystemTime::now(),
        }
    }

    /// An index with nothing but an empty root directory.
    pub fn empty() -> Self {
        Self::build(std::iter::empty())
    }

    /// Real path mapped to exactly this virtual path.
    pub fn real_path(&self, virtual_path: &str) -> Option<&str> {
        self.entries.get(virtual_path).map(String::as_str)
    }

    /// Synthesized directory at exactly this virtual path.
    pub fn directory(&self, virtual_path: &str) -> Option<&DirectoryNode> {
        self.dirs.get(virtual_path)
    }

    pub fn is_entry(&self, virtual_path: &str) -> bool {
        self.entries.contains_key(virtual_path)
    }

    pub fn is_directory(&self, virtual_path: &str) -> bool {
        self.dirs.contains_key(virtual_path)
    }

    /// All `(virtual, real)` pairs, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(v, r)| (v.as_str(), r.as_str()))
    }

    /// All synthesized directory paths, in no particular order.
    pub fn directories(&self) -> impl Iterator<Item = (&str, &DirectoryNode)> {
        self.dirs.iter().map(|(p, node)| (p.as_str(), node))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn directory_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn conflicts(&self) -> &[NamespaceConflict] {
        &self.conflicts
    }

    /// Build time; used as every synthesized directory's timestamps.
    pub fn created(&self) -> SystemTime {
        self.created
    }
}

impl Default for NamespaceIndex {
    fn default() -> Self {
        Self::empty()
    }
}
