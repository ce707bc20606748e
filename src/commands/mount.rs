use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mapperfs::config::Config;
use mapperfs::error::{MapperError, Result};
use mapperfs::mapfs::mount_mapper;
use mapperfs::namespace::{NamespaceIndex, ProjectionStrategy, ReloadCoordinator};
use mapperfs::source::PathSource;
use mapperfs::watcher::{spawn_file_watcher, spawn_signal_listener, watch_and_reload};

use crate::cli::validate_mount_point;

const UNMOUNT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings resolved from the command line and the config file.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub strategy: ProjectionStrategy,
    /// Reload when the input files change.
    pub watch: bool,
    pub dry_run: bool,
}

impl RunOptions {
    pub fn resolve(
        config: &Config,
        mapper: Option<ProjectionStrategy>,
        once: bool,
        dry_run: bool,
    ) -> Self {
        RunOptions {
            strategy: mapper.unwrap_or_else(|| config.get_mapper()),
            watch: !once && config.reload.get_watch(),
            dry_run,
        }
    }
}

/// Load `source`, then either print the namespace or mount it at
/// `mount_point` and serve it until unmounted or interrupted.
pub async fn run_mapper(
    source: Arc<dyn PathSource>,
    mount_point: &Path,
    options: RunOptions,
    config: &Config,
) -> Result<i32> {
    let coordinator = Arc::new(ReloadCoordinator::new(options.strategy));
    let snapshot = coordinator.reload_from(source.as_ref())?;

    if options.dry_run {
        let mut stdout = std::io::stdout().lock();
        print_namespace(&snapshot, &mut stdout)?;
        return Ok(0);
    }
    drop(snapshot);

    validate_mount_point(mount_point)?;
    let mut handle = mount_mapper(mount_point, Arc::clone(&coordinator), &config.mount)?;

    let (trigger_tx, trigger_rx) = tokio::sync::mpsc::unbounded_channel();

    let watch_paths = source.watch_paths();
    let _watcher = if options.watch && !watch_paths.is_empty() {
        match spawn_file_watcher(&watch_paths, trigger_tx.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("Not watching inputs for changes: {}", e);
                None
            }
        }
    } else {
        None
    };
    let signal_task = spawn_signal_listener(trigger_tx)?;
    let reload_task = tokio::spawn(watch_and_reload(
        trigger_rx,
        Arc::clone(&coordinator),
        source,
        config.reload.get_debounce_ms(),
    ));

    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|e| MapperError::Config(format!("Failed to listen for SIGTERM: {}", e)))?;

    let session_result = tokio::select! {
        result = handle.wait() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
        _ = terminate.recv() => None,
    };

    signal_task.abort();
    reload_task.abort();

    match session_result {
        Some(result) => result?,
        None => {
            eprintln!("\nUnmounting {}", handle.mount_point().display());
            handle.unmount(UNMOUNT_TIMEOUT).await?;
        }
    }

    Ok(0)
}

/// Write `virtual<TAB>real` lines sorted by virtual path.
pub fn print_namespace<W: Write>(snapshot: &NamespaceIndex, out: &mut W) -> std::io::Result<()> {
    let mut entries: Vec<(&str, &str)> = snapshot.entries().collect();
    entries.sort_unstable();
    for (virtual_path, real_path) in entries {
        writeln!(out, "{}\t{}", virtual_path, real_path)?;
    }
    for conflict in snapshot.conflicts() {
        eprintln!(
            "Warning: {} is nested under {}",
            conflict.nested, conflict.entry
        );
    }
    out.flush()
}
