use std::collections::{BTreeSet, HashMap, HashSet};

use crate::namespace::path::{join, split};

/// A directory that exists only because entries live beneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryNode {
    children: BTreeSet<String>,
    subdirs: usize,
}

impl DirectoryNode {
    /// Direct child names in lexicographic order.
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains(name)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of children that are themselves synthesized directories.
    pub fn subdir_count(&self) -> usize {
        self.subdirs
    }

    /// Link count reported for this directory: `.`, the parent's entry, and
    /// one `..` per synthesized subdirectory.
    pub fn nlink(&self) -> u32 {
        2 + self.subdirs as u32
    }
}

/// An entry whose virtual path lies beneath another entry's virtual path.
///
/// The outer entry takes precedence for listings of its own path; the inner
/// entry stays resolvable by its exact path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceConflict {
    /// Virtual path of the entry that would also have to be a directory.
    pub entry: String,
    /// Virtual path of the entry nested beneath it.
    pub nested: String,
}

/// Output of directory synthesis.
#[derive(Debug, Default)]
pub struct Synthesis {
    pub dirs: HashMap<String, DirectoryNode>,
    pub conflicts: Vec<NamespaceConflict>,
}

/// Compute the directories implied by a set of virtual paths.
///
/// For each path the walk climbs from its parent toward the root, adding the
/// current basename to the parent's children. It stops at the root, at a
/// parent that is itself an entry, or at a parent that already lists the
/// basename (an earlier path synthesized the rest of the chain). The result
/// does not depend on the order the paths are visited in.
pub fn synthesize(virtual_paths: &HashSet<String>) -> Synthesis {
    let mut ordered: Vec<&String> = virtual_paths.iter().collect();
    ordered.sort();

    let mut children: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut conflicts = Vec::new();

    for path in ordered {
        let (mut dir, mut base) = split(path);
        while !dir.is_empty() && !base.is_empty() {
            if virtual_paths.contains(dir) {
                conflicts.push(NamespaceConflict {
                    entry: dir.to_string(),
                    nested: path.clone(),
                });
                break;
            }
            let names = children.entry(dir.to_string()).or_default();
            if !names.insert(base.to_string()) {
                break;
            }
            (dir, base) = split(dir);
        }
    }

    let dirs = children
        .iter()
        .map(|(path, names)| {
            let subdirs = names
                .iter()
                .filter(|name| children.contains_key(&join(path, name)))
                .count();
            (
                path.clone(),
                DirectoryNode {
                    children: names.clone(),
                    subdirs,
                },
            )
        })
        .collect();

    tracing::trace!("synthesized {} directories", children.len());

    Synthesis { dirs, conflicts }
}
