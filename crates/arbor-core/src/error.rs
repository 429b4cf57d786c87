//! Error taxonomy for persisted state and configuration

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed manifest: {0}")]
    MalformedManifest(#[source] serde_json::Error),
    #[error("malformed graph store at line {line}: {source}")]
    MalformedGraph {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Attach a path to an io error.
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.as_ref().to_path_buf();
        move |source| Error::Io { path, source }
    }
}
