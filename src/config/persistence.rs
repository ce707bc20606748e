use crate::error::{MapperError, Result};
use std::path::Path;

use crate::config::paths::*;
use crate::config::schema::*;

/// Load `config.toml` from the config directory. A missing file yields the
/// defaults.
pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    let config = if !config_path.exists() {
        tracing::debug!("no config file at {}, using defaults", config_path.display());
        Config::default()
    } else {
        let toml_content = std::fs::read_to_string(config_path)
            .map_err(|e| MapperError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&toml_content).map_err(|e| {
            MapperError::Config(format!(
                "Failed to parse config {}: {}",
                config_path.display(),
                e
            ))
        })?
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}

pub fn save_config_to(config: &Config, config_path: &Path) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            MapperError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| MapperError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(config_path, toml_str)
        .map_err(|e| MapperError::Config(format!("Failed to write config file: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ProjectionStrategy;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = load_config_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.mapper = Some(ProjectionStrategy::CommonPrefixTrim);
        config.reload.debounce_ms = Some(750);
        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "mapper = [not toml").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, MapperError::Config(msg) if msg.contains("Failed to parse")));
    }

    #[test]
    fn test_out_of_range_value_is_rejected_on_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[reload]\ndebounce_ms = 1\n").unwrap();

        assert!(load_config_from(&path).is_err());
    }
}
