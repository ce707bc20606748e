use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::MountConfig;
use crate::error::{MapperError, Result};
use crate::mapfs::MapperFs;
use crate::namespace::ReloadCoordinator;

const MOUNT_TIMEOUT: Duration = Duration::from_millis(2000);
const MOUNT_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// A running mount.
pub struct MountHandle {
    mount_point: PathBuf,
    /// Resolves when the FUSE session thread returns, carrying its error if
    /// the session ended abnormally.
    exited: tokio::sync::oneshot::Receiver<std::result::Result<(), String>>,
}

impl MountHandle {
    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    /// Wait for the FUSE session to end.
    pub async fn wait(&mut self) -> Result<()> {
        match (&mut self.exited).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(MapperError::Fuse(e)),
            // Sender dropped without reporting; the thread panicked
            Err(_) => Err(MapperError::Fuse("FUSE session thread exited".to_string())),
        }
    }

    /// Unmount and wait up to `timeout` for the session thread to finish.
    pub async fn unmount(mut self, timeout: Duration) -> Result<()> {
        if !unmount_mapper(&self.mount_point) {
            tracing::warn!(
                "Failed to unmount {} (may already be unmounted)",
                self.mount_point.display()
            );
        }
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(result) => result,
            Err(_) => Err(MapperError::Fuse(format!(
                "FUSE session at {} did not stop within {:?}",
                self.mount_point.display(),
                timeout
            ))),
        }
    }
}

/// Mount the namespace served by `coordinator` at `mount_point` on a
/// background thread.
///
/// Returns once the mount point is reachable, or with an error if the mount
/// failed or did not come up in time.
pub fn mount_mapper(
    mount_point: &Path,
    coordinator: Arc<ReloadCoordinator>,
    config: &MountConfig,
) -> Result<MountHandle> {
    let mount_dir = prepare_mount_point(mount_point)?;
    let mount_point = mount_dir.as_path();

    let filesystem = MapperFs::new(coordinator, config.get_fuse_ttl_secs());

    let mut mount_options = vec![fuser::MountOption::FSName(config.get_fs_name())];
    if config.get_auto_unmount() {
        mount_options.push(fuser::MountOption::AutoUnmount);
    }

    let mount_point_clone = mount_point.to_path_buf();
    let (mount_status_tx, mount_status_rx) =
        std::sync::mpsc::channel::<std::result::Result<(), String>>();
    let (exit_tx, exit_rx) = tokio::sync::oneshot::channel();

    std::thread::spawn(move || {
        tracing::info!("Mounting FUSE filesystem at {}", mount_point_clone.display());

        let outcome = match fuser::mount2(filesystem, &mount_point_clone, &mount_options) {
            Ok(()) => {
                tracing::info!("FUSE filesystem unmounted");
                Ok(())
            }
            Err(e) => {
                tracing::error!("FUSE mount error: {}", e);
                let _ = mount_status_tx.send(Err(e.to_string()));
                Err(e.to_string())
            }
        };
        let _ = exit_tx.send(outcome);
    });

    let start = Instant::now();
    loop {
        match mount_status_rx.try_recv() {
            Ok(Err(e)) => {
                return Err(MapperError::Fuse(format!("FUSE mount failed: {}", e)));
            }
            Ok(Ok(())) => break,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                return Err(MapperError::Fuse(
                    "FUSE session ended before the mount came up".to_string(),
                ));
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {}
        }

        if is_mounted(mount_point) {
            tracing::debug!("FUSE mount verified at {}", mount_point.display());
            break;
        }

        if start.elapsed() >= MOUNT_TIMEOUT {
            return Err(MapperError::Fuse(format!(
                "FUSE mount timed out - {} not mounted after {:?}",
                mount_point.display(),
                MOUNT_TIMEOUT
            )));
        }

        std::thread::sleep(MOUNT_CHECK_INTERVAL);
    }

    Ok(MountHandle {
        mount_point: mount_point.to_path_buf(),
        exited: exit_rx,
    })
}

/// Create the mount directory if needed and resolve it to an absolute path,
/// so that it has a parent to compare devices with.
fn prepare_mount_point(mount_point: &Path) -> Result<PathBuf> {
    fs::create_dir_all(mount_point).map_err(|e| {
        MapperError::Config(format!(
            "Failed to create mount directory {}: {}",
            mount_point.display(),
            e
        ))
    })?;

    mount_point.canonicalize().map_err(|e| {
        MapperError::Config(format!(
            "Failed to resolve mount path {}: {}",
            mount_point.display(),
            e
        ))
    })
}

/// A FUSE mount shows up as a different device than its parent directory.
fn is_mounted(mount_point: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let Some(parent) = mount_point.parent() else {
        return false;
    };
    match (fs::metadata(mount_point), fs::metadata(parent)) {
        (Ok(mounted), Ok(parent)) => mounted.dev() != parent.dev(),
        _ => false,
    }
}

/// Unmount a FUSE filesystem with the platform's unmount helpers.
///
/// Returns true if one of them succeeded.
pub fn unmount_mapper(mount_point: &Path) -> bool {
    let attempts: [(&str, &[&str]); 3] = [
        ("fusermount3", &["-u"]),
        ("fusermount", &["-u"]),
        ("umount", &[]),
    ];

    for (program, args) in attempts {
        match std::process::Command::new(program)
            .args(args)
            .arg(mount_point)
            .stderr(std::process::Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {
                tracing::debug!("unmounted {} with {}", mount_point.display(), program);
                return true;
            }
            Ok(status) => {
                tracing::debug!("{} exited with {}", program, status);
            }
            Err(e) => {
                tracing::debug!("Failed to run {}: {}", program, e);
            }
        }
    }
    false
}
