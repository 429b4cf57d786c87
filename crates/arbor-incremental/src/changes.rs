//! Change detector: classifies every tracked path against the manifest

use std::collections::BTreeMap;
use std::path::Path;

use arbor_core::{ChangeReport, FileChange, HashAlgorithm, Manifest, ScanConfig, ScannedFile};
use arbor_indexer::{TreeWalker, WalkedFile};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{EngineError, Result};

pub struct ChangeDetector {
    walker: TreeWalker,
    algorithm: HashAlgorithm,
}

impl ChangeDetector {
    pub fn new(root: &Path, scan: &ScanConfig, algorithm: HashAlgorithm) -> Result<Self> {
        Ok(Self {
            walker: TreeWalker::new(root, scan)?,
            algorithm,
        })
    }

    /// Walk the tree and hash every tracked file. An unreadable file fails
    /// the scan.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        let walked = self.walker.walk();
        walked
            .into_par_iter()
            .map(|file| self.hash_file(file))
            .collect()
    }

    fn hash_file(&self, file: WalkedFile) -> Result<ScannedFile> {
        let bytes = std::fs::read(&file.abs_path).map_err(|source| EngineError::Read {
            path: file.abs_path.clone(),
            source,
        })?;
        Ok(ScannedFile {
            hash: self.algorithm.digest(&bytes),
            size: bytes.len() as u64,
            path: file.path,
            abs_path: file.abs_path,
            language: file.language,
            last_modified: file.last_modified,
        })
    }

    /// Scan and compare against `manifest`. With no manifest every file is added.
    pub fn detect(&self, manifest: Option<&Manifest>) -> Result<ChangeReport> {
        Ok(compare(self.scan()?, manifest))
    }
}

/// Three-way compare of a scan against the manifest's file set. Byte-exact:
/// modification times are never consulted.
pub fn compare(scanned: Vec<ScannedFile>, manifest: Option<&Manifest>) -> ChangeReport {
    let mut report = ChangeReport::default();
    let current: BTreeMap<String, ScannedFile> =
        scanned.into_iter().map(|f| (f.path.clone(), f)).collect();

    for (path, file) in &current {
        match manifest.and_then(|m| m.file(path)) {
            None => report.added.push(path.clone()),
            Some(entry) if entry.hash != file.hash => report.modified.push(FileChange {
                path: path.clone(),
                old_hash: entry.hash.clone(),
                new_hash: file.hash.clone(),
                old_size: entry.size,
                new_size: file.size,
            }),
            Some(_) => report.unchanged.push(path.clone()),
        }
    }

    if let Some(manifest) = manifest {
        report.deleted = manifest
            .files
            .keys()
            .filter(|path| !current.contains_key(path.as_str()))
            .cloned()
            .collect();
    }

    debug!(
        "Change detection: {} added, {} modified, {} deleted, {} unchanged",
        report.added.len(),
        report.modified.len(),
        report.deleted.len(),
        report.unchanged.len()
    );
    report.current = current;
    report
}
