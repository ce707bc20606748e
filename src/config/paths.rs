use crate::error::{MapperError, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const CONFIG_DIR_ENV: &str = "MAPPERFS_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub fn expand_tilde(path: &str) -> PathBuf {
    let path = path.trim();
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    } else if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(path)
}

pub fn get_config_dir() -> Result<PathBuf> {
    if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(expand_tilde(&config_dir));
    }

    let project_dirs = ProjectDirs::from("org", "mapperfs", "mapperfs")
        .ok_or_else(|| MapperError::Config("Could not determine config directory".to_string()))?;

    Ok(project_dirs.config_dir().to_path_buf())
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/mnt/music"), PathBuf::from("/mnt/music"));
        assert_eq!(expand_tilde(" relative/dir "), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_expand_tilde_uses_home() {
        let Ok(home) = std::env::var("HOME") else {
            return;
        };
        assert_eq!(expand_tilde("~"), PathBuf::from(&home));
        assert_eq!(expand_tilde("~/mnt"), PathBuf::from(&home).join("mnt"));
    }
}
