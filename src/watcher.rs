use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::{MapperError, Result};
use crate::namespace::ReloadCoordinator;
use crate::source::PathSource;

/// Why a reload was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// A watched input file changed.
    Changed(PathBuf),
    /// SIGHUP was received.
    Signal,
}

/// Watch `files` for changes and forward them as triggers.
///
/// Each file's parent directory is watched rather than the file itself, so
/// editors that save by writing a new file and renaming it over the old one
/// are still noticed. The returned watcher stops when dropped.
pub fn spawn_file_watcher(
    files: &[PathBuf],
    tx: UnboundedSender<ReloadTrigger>,
) -> Result<RecommendedWatcher> {
    let watched: HashSet<PathBuf> = files
        .iter()
        .map(|f| absolute_path(f))
        .collect::<Result<_>>()?;

    let filter = watched.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("file watch error: {}", e);
                return;
            }
        };
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        for path in event.paths {
            if filter.contains(&path) {
                tracing::trace!("watched input changed: {:?} ({:?})", path, event.kind);
                let _ = tx.send(ReloadTrigger::Changed(path));
            }
        }
    })?;

    let dirs: HashSet<&Path> = watched.iter().filter_map(|f| f.parent()).collect();
    for dir in dirs {
        tracing::debug!("watching {} for input changes", dir.display());
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }

    Ok(watcher)
}

/// Forward SIGHUP into `tx` until the receiving side closes.
pub fn spawn_signal_listener(
    tx: UnboundedSender<ReloadTrigger>,
) -> Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())
        .map_err(|e| MapperError::Watch(format!("Failed to listen for SIGHUP: {}", e)))?;

    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, reloading");
            if tx.send(ReloadTrigger::Signal).is_err() {
                break;
            }
        }
    }))
}

/// Reload `coordinator` from `source` whenever triggers arrive, once per
/// burst: a reload runs after `debounce_ms` without further triggers.
///
/// A failed re-read leaves the current namespace in place. Returns when every
/// sender has been dropped.
pub async fn watch_and_reload(
    mut trigger_rx: UnboundedReceiver<ReloadTrigger>,
    coordinator: Arc<ReloadCoordinator>,
    source: Arc<dyn PathSource>,
    debounce_ms: u64,
) {
    tracing::debug!("watch_and_reload() started, debounce={}ms", debounce_ms);

    let debounce_duration = Duration::from_millis(debounce_ms);
    let mut pending = 0usize;
    let mut last_event: Option<Instant> = None;

    loop {
        let timeout = match last_event {
            Some(instant) => debounce_duration.saturating_sub(instant.elapsed()),
            None => Duration::from_secs(86400),
        };

        tokio::select! {
            trigger = trigger_rx.recv() => {
                match trigger {
                    Some(trigger) => {
                        tracing::debug!("Received reload trigger: {:?}", trigger);
                        pending += 1;
                        last_event = Some(Instant::now());
                    }
                    None => {
                        tracing::debug!("Trigger channel closed, stopping reloads");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(timeout), if last_event.is_some() => {
                tracing::debug!("Debounce timer expired after {} triggers", pending);
                do_reload(Arc::clone(&coordinator), Arc::clone(&source)).await;
                pending = 0;
                last_event = None;
            }
        }
    }
}

async fn do_reload(coordinator: Arc<ReloadCoordinator>, source: Arc<dyn PathSource>) {
    let result =
        tokio::task::spawn_blocking(move || coordinator.reload_from(source.as_ref())).await;

    match result {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!("Reload failed, keeping current namespace: {}", e),
        Err(e) => tracing::error!("Reload task failed: {}", e),
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        MapperError::Watch(format!("Cannot watch {}: not a file", path.display()))
    })?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let parent = parent.canonicalize().map_err(|e| {
        MapperError::Watch(format!("Cannot watch {}: {}", path.display(), e))
    })?;
    Ok(parent.join(file_name))
}
