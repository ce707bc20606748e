use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapperError>;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("No such entry: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read input {}: {source}", path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Playlist error: {0}")]
    Playlist(String),

    #[error("FUSE error: {0}")]
    Fuse(String),

    #[error("Watch error: {0}")]
    Watch(String),
}

impl MapperError {
    /// The errno reported to the kernel when this error ends a FUSE operation.
    pub fn errno(&self) -> i32 {
        match self {
            MapperError::NotFound(_) => libc::ENOENT,
            MapperError::AccessDenied(_) => libc::EACCES,
            MapperError::Io(e) | MapperError::Input { source: e, .. } => {
                e.raw_os_error().unwrap_or(libc::EIO)
            }
            _ => libc::EIO,
        }
    }
}

impl From<quick_xml::Error> for MapperError {
    fn from(err: quick_xml::Error) -> Self {
        MapperError::Playlist(err.to_string())
    }
}

impl From<notify::Error> for MapperError {
    fn from(err: notify::Error) -> Self {
        MapperError::Watch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(MapperError::NotFound("/x".into()).errno(), libc::ENOENT);
        assert_eq!(MapperError::AccessDenied("/x".into()).errno(), libc::EACCES);
        assert_eq!(MapperError::Config("bad".into()).errno(), libc::EIO);

        let io = std::io::Error::from_raw_os_error(libc::ENOTDIR);
        assert_eq!(MapperError::Io(io).errno(), libc::ENOTDIR);
    }
}
