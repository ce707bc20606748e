use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::namespace::index::{Entry, NamespaceIndex};
use crate::namespace::strategy::ProjectionStrategy;
use crate::source::PathSource;

/// Owns the live namespace and replaces it on reload.
///
/// # Concurrency
///
/// Readers call [`snapshot`](Self::snapshot) once per operation and work on
/// the returned `Arc` without holding any lock. A reload projects the paths
/// and builds the new index with no lock shared with readers, then takes the
/// write lock only long enough to swap one `Arc`. A reader that captured the
/// old snapshot finishes against it; it never observes a partly built index.
///
/// Reloads are serialized among themselves by a separate mutex, so two
/// triggers firing together cannot interleave their swaps out of order.
pub struct ReloadCoordinator {
    strategy: ProjectionStrategy,
    current: RwLock<Arc<NamespaceIndex>>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
}

impl ReloadCoordinator {
    /// Create a coordinator serving an empty namespace.
    pub fn new(strategy: ProjectionStrategy) -> Self {
        ReloadCoordinator {
            strategy,
            current: RwLock::new(Arc::new(NamespaceIndex::empty())),
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a coordinator and load `real_paths` into it.
    pub fn with_paths<S: AsRef<str>>(strategy: ProjectionStrategy, real_paths: &[S]) -> Self {
        let coordinator = Self::new(strategy);
        coordinator.reload(real_paths);
        coordinator
    }

    pub fn strategy(&self) -> ProjectionStrategy {
        self.strategy
    }

    /// Number of reloads so far. Changes whenever a new index is installed.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The index currently being served.
    pub fn snapshot(&self) -> Arc<NamespaceIndex> {
        self.current.read().clone()
    }

    /// Project `real_paths` with this coordinator's strategy and make the
    /// result the live namespace. Returns the new snapshot.
    pub fn reload<S: AsRef<str>>(&self, real_paths: &[S]) -> Arc<NamespaceIndex> {
        let _reloading = self.reload_lock.lock();
        let entries = self.strategy.project(real_paths);
        self.install(entries)
    }

    /// Make an explicit entry set the live namespace, bypassing projection.
    pub fn reload_entries(&self, entries: Vec<Entry>) -> Arc<NamespaceIndex> {
        let _reloading = self.reload_lock.lock();
        self.install(entries)
    }

    /// Re-read `source` and reload from it. On a read failure the current
    /// namespace stays in place and the error is returned.
    pub fn reload_from(&self, source: &dyn PathSource) -> Result<Arc<NamespaceIndex>> {
        let real_paths = source.real_paths()?;
        Ok(self.reload(&real_paths))
    }

    fn install(&self, entries: Vec<Entry>) -> Arc<NamespaceIndex> {
        let next = Arc::new(NamespaceIndex::build(entries));
        let previous = {
            let mut current = self.current.write();
            std::mem::replace(&mut *current, Arc::clone(&next))
        };
        self.generation.fetch_add(1, Ordering::Release);

        tracing::info!(
            "namespace reloaded: {} entries, {} directories",
            next.entry_count(),
            next.directory_count()
        );
        // The old index is freed here, outside the write lock, unless a
        // reader still holds it.
        drop(previous);
        next
    }
}
