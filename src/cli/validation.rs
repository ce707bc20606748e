use mapperfs::error::{MapperError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A mount point must be a directory, or not exist yet.
pub fn validate_mount_point(mount_point: &Path) -> Result<()> {
    if mount_point.as_os_str().is_empty() {
        return Err(MapperError::Config(
            "Mount point cannot be empty".to_string(),
        ));
    }

    if mount_point.exists() && !mount_point.is_dir() {
        return Err(MapperError::Config(format!(
            "Mount point {} is not a directory",
            mount_point.display()
        )));
    }

    Ok(())
}

/// Every input must be a readable file; `-` (stdin) may appear once.
pub fn validate_inputs(inputs: &[PathBuf]) -> Result<()> {
    let mut seen = HashSet::new();
    for input in inputs {
        if input.as_os_str() == "-" {
            if !seen.insert(input) {
                return Err(MapperError::Config(
                    "Standard input ('-') can only be given once".to_string(),
                ));
            }
            continue;
        }

        if let Err(source) = std::fs::metadata(input) {
            return Err(MapperError::Input {
                path: input.clone(),
                source,
            });
        }
        if input.is_dir() {
            return Err(MapperError::Config(format!(
                "Input {} is a directory",
                input.display()
            )));
        }
    }
    Ok(())
}
