use crate::cli::ConfigAction;
use mapperfs::config::{get_config_path, load_config, save_config, Config};
use mapperfs::error::{MapperError, Result};

pub fn handle_config_command(action: Option<ConfigAction>) -> Result<()> {
    match action {
        Some(ConfigAction::Path) => {
            let config_path = get_config_path()?;
            println!("Config location: {}", config_path.display());
        }
        None | Some(ConfigAction::Show) => {
            let config_path = get_config_path()?;
            let config = load_config()?;
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("Config file: {} (not found, using defaults)", config_path.display());
            }
            println!();
            println!("Current configuration:");
            println!("  mapper: {}", config.get_mapper());
            println!("  Mount:");
            println!("    fuse_ttl_secs: {}", config.mount.get_fuse_ttl_secs());
            println!("    fs_name: {}", config.mount.get_fs_name());
            println!("    auto_unmount: {}", config.mount.get_auto_unmount());
            println!("  Reload:");
            println!("    debounce_ms: {}", config.reload.get_debounce_ms());
            println!("    watch: {}", config.reload.get_watch());
        }
        Some(ConfigAction::Init { force }) => {
            let config_path = get_config_path()?;
            if config_path.exists() && !force {
                return Err(MapperError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                )));
            }
            save_config(&Config::with_defaults())?;
            println!("Created default config at {}", config_path.display());
        }
    }
    Ok(())
}
