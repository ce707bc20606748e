//! Where the list of real paths comes from.
//!
//! A source is re-read on every reload, so it must be able to produce the
//! full list again at any time.

mod listing;
mod playlist;

pub use listing::{parse_listing, ListingSource};
pub use playlist::{playlist_files, PlaylistSource};

use std::path::PathBuf;

use crate::error::Result;

/// Produces the ordered list of real paths to project.
pub trait PathSource: Send + Sync {
    /// Read the current list of real paths.
    fn real_paths(&self) -> Result<Vec<String>>;

    /// Files whose modification should trigger a reload.
    fn watch_paths(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Real paths given directly, e.g. as command-line arguments.
#[derive(Debug, Clone)]
pub struct ArgsSource {
    paths: Vec<String>,
}

impl ArgsSource {
    pub fn new(paths: Vec<String>) -> Self {
        ArgsSource { paths }
    }
}

impl PathSource for ArgsSource {
    fn real_paths(&self) -> Result<Vec<String>> {
        Ok(self.paths.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_source_returns_paths_in_order() {
        let source = ArgsSource::new(vec!["/b".to_string(), "/a".to_string()]);
        assert_eq!(source.real_paths().unwrap(), vec!["/b", "/a"]);
        assert!(source.watch_paths().is_empty());
    }
}
