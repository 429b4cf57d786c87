//! Parser and walker failures

use std::path::PathBuf;

use thiserror::Error;

/// A file the parser layer could not turn into units. Recovered per file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no grammar for {0}")]
    Unsupported(String),
    #[error("failed to load {language} grammar: {reason}")]
    Grammar {
        language: &'static str,
        reason: String,
    },
    #[error("tree-sitter produced no tree for {0}")]
    NoTree(String),
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("tree root {} does not exist or is not a directory", .0.display())]
    RootMissing(PathBuf),
    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("invalid ignore file: {0}")]
    IgnoreFile(#[from] ignore::Error),
}
