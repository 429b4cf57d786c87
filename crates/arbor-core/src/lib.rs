//! Arbor Core: data model, fingerprint store, graph store, and dependency engine

pub mod cache;
pub mod config;
pub mod dependency;
pub mod error;
pub mod graph_store;
pub mod hashing;
pub mod manifest;
pub mod model;

#[cfg(test)]
pub mod tests;

pub use cache::{
    CACHE_DIR, CONFIG_FILE, GRAPH_FILE, MANIFEST_FILE, cache_dir, clear_cache, config_path,
    ensure_cache_dir, graph_path, manifest_path, write_atomic,
};
pub use config::{
    AnalysisConfig, ArborConfig, Granularity, IncrementalConfig, ScanConfig, ensure_config,
    load_config,
};
pub use dependency::{DependencyGraph, ImpactReport};
pub use error::{Error, Result};
pub use graph_store::GraphStore;
pub use hashing::{HashAlgorithm, normalize_source};
pub use manifest::{FileEntry, GlobalStats, MANIFEST_VERSION, Manifest, ManifestStore, RunMode, UnitFingerprint};
pub use model::{
    ChangeReport, FileChange, GraphRecord, Language, ScannedFile, UnitChangeReport, UnitDelta,
    UnitRename, UnitState, relative_key,
};
