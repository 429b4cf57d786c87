//! Engine configuration, read from `.arbor/config.toml`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::{config_path, ensure_cache_dir, write_atomic};
use crate::error::{Error, Result};
use crate::hashing::HashAlgorithm;

/// Resolution at which stale analysis is invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    File,
    Unit,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::File => "file",
            Granularity::Unit => "unit",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "file" => Ok(Granularity::File),
            "unit" => Ok(Granularity::Unit),
            other => Err(format!(
                "invalid granularity '{other}', expected one of: file, unit"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ArborConfig {
    pub granularity: Granularity,
    pub incremental: IncrementalConfig,
    pub analysis: AnalysisConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncrementalConfig {
    pub hash_algorithm: HashAlgorithm,
    pub store_source: bool,
    pub detect_renames: bool,
    pub similarity_threshold: f64,
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::Sha256,
            store_source: false,
            detect_renames: false,
            similarity_threshold: 0.85,
        }
    }
}

impl IncrementalConfig {
    /// Rename detection needs the previous source text, so it implies storing it.
    pub fn retains_source(&self) -> bool {
        self.store_source || self.detect_renames
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub track_dependencies: bool,
    pub max_call_depth: usize,
    pub entry_point_max_callers: usize,
    pub max_calls_per_unit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            track_dependencies: true,
            max_call_depth: 10,
            entry_point_max_callers: 2,
            max_calls_per_unit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Gitignore-syntax file honoured in addition to `.gitignore`.
    pub ignore_file: String,
    pub extra_ignores: Vec<String>,
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_file: ".arborignore".to_owned(),
            extra_ignores: Vec::new(),
            max_file_size: 1024 * 1024,
        }
    }
}

impl ArborConfig {
    pub fn validate(&self) -> Result<()> {
        let threshold = self.incremental.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidConfig(format!(
                "incremental.similarityThreshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.analysis.max_call_depth == 0 {
            return Err(Error::InvalidConfig(
                "analysis.maxCallDepth must be at least 1".to_owned(),
            ));
        }
        if self.analysis.max_calls_per_unit == 0 {
            return Err(Error::InvalidConfig(
                "analysis.maxCallsPerUnit must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Load the workspace config, falling back to defaults when absent.
pub fn load_config(root: impl AsRef<Path>) -> Result<ArborConfig> {
    let path = config_path(root.as_ref());
    if !path.exists() {
        return Ok(ArborConfig::default());
    }

    let raw = std::fs::read_to_string(&path).map_err(Error::io(&path))?;
    let config: ArborConfig = toml::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

/// Write the default config if none exists, then load it.
pub fn ensure_config(root: impl AsRef<Path>) -> Result<ArborConfig> {
    let root = root.as_ref();
    ensure_cache_dir(root)?;

    let path = config_path(root);
    if path.exists() {
        return load_config(root);
    }

    let config = ArborConfig::default();
    let content = toml::to_string_pretty(&config)?;
    write_atomic(&path, content.as_bytes())?;
    tracing::info!("Wrote default config to {}", path.display());

    Ok(config)
}
