pub mod paths;
pub mod persistence;
pub mod schema;

pub use paths::*;
pub use persistence::*;
pub use schema::*;

fn default_fuse_ttl_secs() -> u64 {
    1
}

fn default_fs_name() -> String {
    "mapperfs".to_string()
}

fn default_auto_unmount() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_watch() -> bool {
    true
}
