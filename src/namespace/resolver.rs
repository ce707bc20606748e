use std::path::{Path, PathBuf};

use crate::error::{MapperError, Result};
use crate::namespace::index::NamespaceIndex;
use crate::namespace::path::{normalize, split};
use crate::namespace::synth::DirectoryNode;

/// What a virtual path refers to within one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget<'a> {
    /// A real path to hand to the OS as-is.
    Leaf(PathBuf),
    /// A synthesized directory with no backing real path.
    Directory(&'a DirectoryNode),
}

impl<'a> ResolvedTarget<'a> {
    pub fn real_path(&self) -> Option<&Path> {
        match self {
            ResolvedTarget::Leaf(path) => Some(path),
            ResolvedTarget::Directory(_) => None,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        matches!(self, ResolvedTarget::Directory(_))
    }

    /// Fails with `AccessDenied` for synthesized directories, which are
    /// read-only.
    pub fn ensure_writable(&self, virtual_path: &str) -> Result<&Path> {
        match self {
            ResolvedTarget::Leaf(path) => Ok(path),
            ResolvedTarget::Directory(_) => {
                Err(MapperError::AccessDenied(virtual_path.to_string()))
            }
        }
    }
}

impl NamespaceIndex {
    /// Resolve a virtual path against this snapshot.
    ///
    /// Exact entries win, then synthesized directories. Anything else is
    /// looked up beneath the nearest entry ancestor, provided that entry maps
    /// to a real directory; the remaining components are appended to its real
    /// path.
    pub fn resolve(&self, virtual_path: &str) -> Result<ResolvedTarget<'_>> {
        let path = normalize(virtual_path);
        tracing::trace!("lookup: {}", path);

        if let Some(real) = self.real_path(&path) {
            tracing::trace!("resolved {} to {}", path, real);
            return Ok(ResolvedTarget::Leaf(PathBuf::from(real)));
        }
        if let Some(node) = self.directory(&path) {
            tracing::trace!("resolved {} to a directory", path);
            return Ok(ResolvedTarget::Directory(node));
        }

        self.resolve_beneath_entry(&path)
            .map(ResolvedTarget::Leaf)
            .ok_or(MapperError::NotFound(path))
    }

    /// Walk up from `path` looking for an entry that exposes a real directory.
    /// Synthesized directories on the way are passed through.
    fn resolve_beneath_entry(&self, path: &str) -> Option<PathBuf> {
        let (mut prefix, mut base) = split(path);
        let mut suffix: Vec<&str> = Vec::new();

        while !prefix.is_empty() && !base.is_empty() {
            suffix.push(base);

            if let Some(real) = self.real_path(prefix) {
                let real = Path::new(real);
                if !real.is_dir() {
                    tracing::debug!("{} maps to {}, which is not a directory", prefix, real.display());
                    return None;
                }
                let mut target = real.to_path_buf();
                target.extend(suffix.iter().rev());
                tracing::debug!("resolved {} beneath {} to {}", path, prefix, target.display());
                return Some(target);
            }

            // A synthesized directory can sit beneath an entry when entries
            // nest, so keep climbing past it.
            if self.is_directory(prefix) {
                tracing::trace!("{} is synthesized, continuing upward", prefix);
            }

            (prefix, base) = split(prefix);
        }

        None
    }
}
