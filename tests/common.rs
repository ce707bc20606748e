use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;

/// Get the path to the mapperfs binary for testing.
#[allow(dead_code)]
pub fn get_mapperfs_path() -> PathBuf {
    assert_cmd::cargo::cargo_bin!("mapperfs").to_path_buf()
}

// MAPPERFS_CONFIG_DIR is process-wide; tests that set it take turns.
static CONFIG_ENV_LOCK: Mutex<()> = Mutex::new(());

/// Points MAPPERFS_CONFIG_DIR at a fresh temp directory for the lifetime of
/// the context.
#[allow(dead_code)]
pub struct TestConfigContext {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
    _guard: MutexGuard<'static, ()>,
}

impl Default for TestConfigContext {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestConfigContext {
    pub fn new() -> Self {
        let guard = CONFIG_ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("config");

        env::set_var(
            "MAPPERFS_CONFIG_DIR",
            config_dir.to_string_lossy().to_string(),
        );

        Self {
            temp_dir,
            config_dir,
            _guard: guard,
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn write_config(&self, content: &str) {
        fs::create_dir_all(&self.config_dir).expect("Failed to create config dir");
        fs::write(self.config_file(), content).expect("Failed to write config file");
    }
}

impl Drop for TestConfigContext {
    fn drop(&mut self) {
        env::remove_var("MAPPERFS_CONFIG_DIR");
    }
}

/// Create `relative` (and its parents) under `root` with `content`, returning
/// the absolute path as a string.
#[allow(dead_code)]
pub fn create_file(root: &Path, relative: &str, content: &str) -> String {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(&path, content).expect("Failed to write file");
    path.to_string_lossy().to_string()
}

/// Write a listing file with one path per line.
#[allow(dead_code)]
pub fn write_listing(path: &Path, paths: &[&str]) {
    let mut content = paths.join("\n");
    content.push('\n');
    fs::write(path, content).expect("Failed to write listing");
}

/// Parse `virtual<TAB>real` lines printed by `--dry-run`.
#[allow(dead_code)]
pub fn parse_dry_run(stdout: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(v, r)| (v.to_string(), r.to_string()))
        .collect()
}
