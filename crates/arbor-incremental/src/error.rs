//! Whole-run failures. Per-file parser failures are not errors here; they
//! are collected on the run summary.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] arbor_core::Error),
    #[error(transparent)]
    Walk(#[from] arbor_indexer::WalkError),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
