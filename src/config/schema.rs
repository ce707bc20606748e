use crate::error::{MapperError, Result};
use crate::namespace::ProjectionStrategy;
use serde::{Deserialize, Serialize};

pub const MIN_DEBOUNCE_MS: u64 = 10;
pub const MAX_DEBOUNCE_MS: u64 = 60000;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MountConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuse_ttl_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_unmount: Option<bool>,
}

impl MountConfig {
    pub fn get_fuse_ttl_secs(&self) -> u64 {
        self.fuse_ttl_secs
            .unwrap_or_else(super::default_fuse_ttl_secs)
    }

    pub fn get_fs_name(&self) -> String {
        self.fs_name.clone().unwrap_or_else(super::default_fs_name)
    }

    pub fn get_auto_unmount(&self) -> bool {
        self.auto_unmount
            .unwrap_or_else(super::default_auto_unmount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ReloadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
}

impl ReloadConfig {
    pub fn get_debounce_ms(&self) -> u64 {
        self.debounce_ms.unwrap_or_else(super::default_debounce_ms)
    }

    pub fn get_watch(&self) -> bool {
        self.watch.unwrap_or_else(super::default_watch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Projection strategy used when `--mapper` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapper: Option<ProjectionStrategy>,
    #[serde(default)]
    pub mount: MountConfig,
    #[serde(default)]
    pub reload: ReloadConfig,
}

impl Config {
    /// A config with every value spelled out, for writing a starter file.
    pub fn with_defaults() -> Self {
        Config {
            mapper: Some(ProjectionStrategy::default()),
            mount: MountConfig {
                fuse_ttl_secs: Some(super::default_fuse_ttl_secs()),
                fs_name: Some(super::default_fs_name()),
                auto_unmount: Some(super::default_auto_unmount()),
            },
            reload: ReloadConfig {
                debounce_ms: Some(super::default_debounce_ms()),
                watch: Some(super::default_watch()),
            },
        }
    }

    pub fn get_mapper(&self) -> ProjectionStrategy {
        self.mapper.unwrap_or_default()
    }
}

pub fn validate_config(config: &Config) -> Result<()> {
    let debounce_ms = config.reload.get_debounce_ms();
    if !(MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&debounce_ms) {
        return Err(MapperError::Config(format!(
            "reload.debounce_ms ({}) must be between {} and {}",
            debounce_ms, MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS
        )));
    }

    if config.mount.get_fs_name().trim().is_empty() {
        return Err(MapperError::Config(
            "mount.fs_name must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.get_mapper(), ProjectionStrategy::Identity);
        assert_eq!(config.mount.get_fuse_ttl_secs(), 1);
        assert_eq!(config.mount.get_fs_name(), "mapperfs");
        assert!(config.mount.get_auto_unmount());
        assert_eq!(config.reload.get_debounce_ms(), 200);
        assert!(config.reload.get_watch());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
mapper = "flat"

[mount]
fuse_ttl_secs = 5
fs_name = "music"
auto_unmount = false

[reload]
debounce_ms = 1000
watch = false
"#,
        )
        .unwrap();

        assert_eq!(config.get_mapper(), ProjectionStrategy::Flatten);
        assert_eq!(config.mount.get_fuse_ttl_secs(), 5);
        assert_eq!(config.mount.get_fs_name(), "music");
        assert!(!config.mount.get_auto_unmount());
        assert_eq!(config.reload.get_debounce_ms(), 1000);
        assert!(!config.reload.get_watch());
    }

    #[test]
    fn test_with_defaults_matches_getters() {
        let explicit = Config::with_defaults();
        let implicit = Config::default();
        assert_eq!(explicit.get_mapper(), implicit.get_mapper());
        assert_eq!(
            explicit.reload.get_debounce_ms(),
            implicit.reload.get_debounce_ms()
        );
        assert_eq!(explicit.mount.get_fs_name(), implicit.mount.get_fs_name());

        let toml_str = toml::to_string_pretty(&explicit).unwrap();
        assert!(toml_str.contains("mapper = \"copy\""));
        assert!(toml_str.contains("debounce_ms = 200"));
    }

    #[test]
    fn test_unknown_mapper_is_rejected() {
        assert!(toml::from_str::<Config>("mapper = \"sideways\"").is_err());
    }

    #[test]
    fn test_debounce_bounds() {
        let mut config = Config::default();
        config.reload.debounce_ms = Some(MIN_DEBOUNCE_MS - 1);
        assert!(validate_config(&config).is_err());

        config.reload.debounce_ms = Some(MAX_DEBOUNCE_MS + 1);
        assert!(validate_config(&config).is_err());

        config.reload.debounce_ms = Some(MAX_DEBOUNCE_MS);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_fs_name_is_rejected() {
        let mut config = Config::default();
        config.mount.fs_name = Some("  ".to_string());
        assert!(matches!(
            validate_config(&config),
            Err(MapperError::Config(_))
        ));
    }
}
