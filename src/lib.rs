pub mod config;
pub mod error;
pub mod mapfs;
pub mod namespace;
pub mod source;
pub mod watcher;

pub use config::load_config;
pub use config::save_config;
pub use config::Config;

pub use error::{MapperError, Result};

pub use mapfs::{mount_mapper, MapperFs};
pub use namespace::{Entry, NamespaceIndex, ProjectionStrategy, ReloadCoordinator, ResolvedTarget};
pub use source::PathSource;

pub use watcher::watch_and_reload;
