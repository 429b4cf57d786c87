//! Fingerprint store: per-file and per-unit hashes from the last analysis

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{manifest_path, write_atomic};
use crate::config::Granularity;
use crate::error::{Error, Result};
use crate::hashing::HashAlgorithm;

pub const MANIFEST_VERSION: u32 = 1;

/// Durable record of what the last run analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: u32,
    pub granularity: Granularity,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    pub generated: DateTime<Utc>,
    pub files: BTreeMap<String, FileEntry>,
    #[serde(default)]
    pub global_stats: GlobalStats,
}

impl Manifest {
    pub fn new(granularity: Granularity, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            version: MANIFEST_VERSION,
            granularity,
            hash_algorithm,
            generated: Utc::now(),
            files: BTreeMap::new(),
            global_stats: GlobalStats::default(),
        }
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    /// Prior per-unit fingerprints for `path`, if they were recorded.
    pub fn unit_fingerprints(&self, path: &str) -> Option<&BTreeMap<String, UnitFingerprint>> {
        self.files.get(path)?.unit_fingerprints.as_ref()
    }

    /// Whether a run with these settings can build on this manifest.
    pub fn is_compatible(&self, granularity: Granularity, hash_algorithm: HashAlgorithm) -> bool {
        self.version == MANIFEST_VERSION
            && self.granularity == granularity
            && self.hash_algorithm == hash_algorithm
    }

    pub fn total_units(&self) -> usize {
        self.files.values().map(|f| f.units.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub hash: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// Unit identifiers in source order.
    pub units: Vec<String>,
    /// Present only under unit granularity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_fingerprints: Option<BTreeMap<String, UnitFingerprint>>,
}

/// Fingerprint of one unit, keyed in the manifest by its name within the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitFingerprint {
    pub id: String,
    pub hash: String,
    pub line: u32,
    pub end_line: u32,
    pub size: u64,
    #[serde(rename = "async")]
    pub is_async: bool,
    /// Verbatim source, kept only when rename detection needs it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Full,
    Incremental,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_files: usize,
    pub total_units: usize,
    pub total_records: usize,
    pub last_run: RunMode,
}

/// Reads and writes `.arbor/manifest.json`.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: manifest_path(root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest. `None` means no usable prior analysis: the file is
    /// missing, malformed, or written by an incompatible version.
    pub fn load(&self) -> Result<Option<Manifest>> {
        match self.read() {
            Ok(manifest) => Ok(manifest),
            Err(Error::MalformedManifest(e)) => {
                warn!("Ignoring malformed manifest {}: {}", self.path.display(), e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`load`](Self::load) but surfaces a malformed manifest as an error.
    pub fn read(&self) -> Result<Option<Manifest>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No manifest at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let manifest: Manifest = serde_json::from_str(&raw).map_err(Error::MalformedManifest)?;
        if manifest.version != MANIFEST_VERSION {
            warn!(
                "Manifest version {} does not match {}, ignoring it",
                manifest.version, MANIFEST_VERSION
            );
            return Ok(None);
        }
        debug!(
            "Loaded manifest with {} files from {}",
            manifest.files.len(),
            self.path.display()
        );
        Ok(Some(manifest))
    }

    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        write_atomic(&self.path, json.as_bytes())
    }
}
