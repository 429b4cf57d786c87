//! Analysis engine: one full or incremental pass over a source tree
//!
//! A run reads the manifest and graph store, detects changed files, parses
//! only those, splices the fresh records into the graph, and writes both
//! artifacts back. Nothing is written unless the whole pass succeeds.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use arbor_core::{
    ArborConfig, ChangeReport, DependencyGraph, FileEntry, GlobalStats, Granularity, GraphRecord,
    GraphStore, HashAlgorithm, Manifest, ManifestStore, RunMode, ScannedFile, UnitChangeReport,
    UnitFingerprint, UnitRename, clear_cache, ensure_cache_dir, graph_path, load_config,
};
use arbor_indexer::{EffectClassifier, ExtractedFile, ParseError, ParserRegistry, RecordBuilder, WalkError};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::changes::ChangeDetector;
use crate::error::{EngineError, Result};
use crate::units::{diff_units, unit_states};
use crate::updater::{AnalyzedFile, GraphUpdater};

/// A file or unit the parser could not analyze. Its previous state is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub file: String,
    /// The unit's manifest key, or `None` when the whole file failed.
    pub unit: Option<String>,
    pub reason: String,
}

/// A stale file as read for analysis. Hash and size describe the bytes that
/// were parsed, which can be newer than the scan.
struct ParsedFile {
    hash: String,
    size: u64,
    file: ExtractedFile,
}

/// Result of analyzing one parsed file.
struct FileAnalysis {
    entry: FileEntry,
    update: AnalyzedFile,
    failures: Vec<UnitFailure>,
    /// Old records of failed units, carried into `update.records`.
    carried: usize,
}

impl std::fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{}#{}: {}", self.file, unit, self.reason),
            None => write!(f, "{}: {}", self.file, self.reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyStats {
    pub units: usize,
    pub edges: usize,
    pub cycles: usize,
    pub entry_points: usize,
    pub leaves: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RunMode,
    pub granularity: Granularity,
    pub files_added: usize,
    pub files_modified: usize,
    pub files_deleted: usize,
    pub files_unchanged: usize,
    /// Records derived afresh this run.
    pub units_reanalyzed: usize,
    /// Records carried over untouched.
    pub units_retained: usize,
    pub records_removed: usize,
    /// Per-file unit reports, under unit granularity.
    pub unit_changes: Vec<UnitChangeReport>,
    pub renames: Vec<UnitRename>,
    pub failures: Vec<UnitFailure>,
    /// Records in the graph store after the run.
    pub records: usize,
    pub dependencies: Option<DependencyStats>,
    /// Whether the manifest and graph store were rewritten.
    pub written: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new(mode: RunMode, granularity: Granularity, changes: &ChangeReport) -> Self {
        Self {
            mode,
            granularity,
            files_added: changes.added.len(),
            files_modified: changes.modified.len(),
            files_deleted: changes.deleted.len(),
            files_unchanged: changes.unchanged.len(),
            units_reanalyzed: 0,
            units_retained: 0,
            records_removed: 0,
            unit_changes: Vec::new(),
            renames: Vec::new(),
            failures: Vec::new(),
            records: 0,
            dependencies: None,
            written: false,
            elapsed: Duration::ZERO,
        }
    }

    pub fn files_changed(&self) -> usize {
        self.files_added + self.files_modified + self.files_deleted
    }
}

/// What the next run would do, computed without writing anything.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub mode: RunMode,
    pub changes: ChangeReport,
    pub last_run: Option<GlobalStats>,
}

pub struct Engine {
    config: ArborConfig,
    classifier: EffectClassifier,
}

impl Engine {
    pub fn new(config: ArborConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier: EffectClassifier::new(),
        })
    }

    /// Engine configured from `<root>/.arbor/config.toml`.
    pub fn for_root(root: &Path) -> Result<Self> {
        Self::new(load_config(root)?)
    }

    fn granularity(&self) -> Granularity {
        self.config.granularity
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.config.incremental.hash_algorithm
    }

    /// Run one analysis pass and persist the result.
    pub fn run(&self, root: &Path) -> Result<RunSummary> {
        let started = Instant::now();
        let root = resolve_root(root)?;
        let baseline = self.load_baseline(&root)?;
        let mode = match baseline {
            Some(_) => RunMode::Incremental,
            None => RunMode::Full,
        };
        let (previous, mut store) = match baseline {
            Some((manifest, store)) => (Some(manifest), store),
            None => (None, GraphStore::new()),
        };

        let detector = ChangeDetector::new(&root, &self.config.scan, self.algorithm())?;
        let changes = detector.detect(previous.as_ref())?;
        let mut summary = RunSummary::new(mode, self.granularity(), &changes);

        if mode == RunMode::Incremental && changes.is_empty() {
            info!("Graph is up to date ({} files unchanged)", changes.unchanged.len());
            summary.records = store.len();
            summary.units_retained = store.len();
            summary.dependencies = self.dependency_stats(&store);
            summary.elapsed = started.elapsed();
            return Ok(summary);
        }

        let stale = changes.stale_paths();
        info!(
            "{} analysis: {} stale files, {} deleted, {} unchanged",
            match mode {
                RunMode::Full => "Full",
                RunMode::Incremental => "Incremental",
            },
            stale.len(),
            changes.deleted.len(),
            changes.unchanged.len()
        );

        let mut entries: BTreeMap<String, FileEntry> = BTreeMap::new();
        let mut analyzed = Vec::new();
        let mut carried = 0;
        for (path, result) in self.parse_stale(&changes, &stale) {
            let Some(scanned) = changes.current.get(path) else {
                continue;
            };
            match result {
                Ok(parsed) => {
                    let analysis = self.analyze_file(scanned, previous.as_ref(), &store, parsed);
                    if let Some(units) = &analysis.update.units {
                        summary.renames.extend(units.renamed.iter().cloned());
                        summary.unit_changes.push(units.clone());
                    }
                    for failure in &analysis.failures {
                        warn!("Skipping {}", failure);
                    }
                    summary.failures.extend(analysis.failures);
                    carried += analysis.carried;
                    entries.insert(path.to_string(), analysis.entry);
                    analyzed.push(analysis.update);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path, e);
                    summary.failures.push(UnitFailure {
                        file: path.to_string(),
                        unit: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let stats = GraphUpdater::new(self.granularity()).apply(&mut store, &changes.deleted, analyzed);
        let manifest = self.next_manifest(&changes, previous.as_ref(), entries, &store, mode);

        ensure_cache_dir(&root)?;
        store.save(&graph_path(&root))?;
        ManifestStore::new(&root).save(&manifest)?;

        summary.units_reanalyzed = stats.inserted.saturating_sub(carried);
        summary.units_retained = store.len().saturating_sub(summary.units_reanalyzed);
        summary.records_removed = stats.removed;
        summary.records = store.len();
        summary.dependencies = self.dependency_stats(&store);
        summary.written = true;
        summary.elapsed = started.elapsed();

        info!(
            "Analyzed {} files: {} records re-derived, {} retained, {} removed, {} failures in {:?}",
            stale.len(),
            summary.units_reanalyzed,
            summary.units_retained,
            summary.records_removed,
            summary.failures.len(),
            summary.elapsed
        );
        Ok(summary)
    }

    /// Change detection only. Never writes.
    pub fn status(&self, root: &Path) -> Result<StatusReport> {
        let root = resolve_root(root)?;
        let baseline = self.load_baseline(&root)?;
        let detector = ChangeDetector::new(&root, &self.config.scan, self.algorithm())?;
        let changes = detector.detect(baseline.as_ref().map(|(manifest, _)| manifest))?;

        Ok(StatusReport {
            mode: match baseline {
                Some(_) => RunMode::Incremental,
                None => RunMode::Full,
            },
            last_run: baseline.map(|(manifest, _)| manifest.global_stats),
            changes,
        })
    }

    /// Remove the manifest and graph store, keeping the configuration.
    pub fn clear(root: &Path) -> Result<()> {
        let root = resolve_root(root)?;
        clear_cache(&root)?;
        info!("Cleared analysis state under {}", root.display());
        Ok(())
    }

    /// Prior state to build on, or `None` when a full run is required.
    fn load_baseline(&self, root: &Path) -> Result<Option<(Manifest, GraphStore)>> {
        let manifest = match ManifestStore::new(root).load()? {
            Some(manifest) if manifest.is_compatible(self.granularity(), self.algorithm()) => {
                manifest
            }
            Some(manifest) => {
                info!(
                    "Manifest uses {} granularity with {} hashing, configuration wants {} with {}",
                    manifest.granularity.as_str(),
                    manifest.hash_algorithm.as_str(),
                    self.granularity().as_str(),
                    self.algorithm().as_str()
                );
                return Ok(None);
            }
            None => {
                debug!("No usable manifest under {}", root.display());
                return Ok(None);
            }
        };

        match GraphStore::load(&graph_path(root)) {
            Ok(Some(store)) => Ok(Some((manifest, store))),
            Ok(None) => {
                info!("Graph store missing, rebuilding from scratch");
                Ok(None)
            }
            Err(arbor_core::Error::MalformedGraph { line, source }) => {
                warn!("Graph store line {} is malformed ({}), rebuilding", line, source);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse stale files across the rayon pool, one registry per worker.
    /// Results come back in `stale` order.
    fn parse_stale<'c>(
        &self,
        changes: &'c ChangeReport,
        stale: &[&'c str],
    ) -> Vec<(&'c str, Result<ParsedFile, ParseError>)> {
        let algorithm = self.algorithm();
        stale
            .par_iter()
            .map_init(
                || ParserRegistry::new(algorithm),
                |registry, &path| {
                    let result = match changes.current.get(path) {
                        Some(file) => read_and_extract(registry, file),
                        None => Err(ParseError::Unsupported(path.to_string())),
                    };
                    (path, result)
                },
            )
            .collect()
    }

    /// Records and manifest entry for one parsed file. Units whose own
    /// syntax is broken are reported and keep their previous record and
    /// fingerprint, if they had one.
    fn analyze_file(
        &self,
        scanned: &ScannedFile,
        previous: Option<&Manifest>,
        store: &GraphStore,
        parsed: ParsedFile,
    ) -> FileAnalysis {
        let ParsedFile { hash, size, file } = parsed;
        let builder = RecordBuilder::new(&self.classifier, self.config.analysis.max_calls_per_unit);

        let failed: HashSet<&str> = file
            .units
            .iter()
            .filter(|unit| unit.has_error)
            .map(|unit| unit.key.as_str())
            .collect();
        let failures: Vec<UnitFailure> = file
            .units
            .iter()
            .filter(|unit| unit.has_error)
            .map(|unit| UnitFailure {
                file: file.path.clone(),
                unit: Some(unit.key.clone()),
                reason: format!("syntax error in lines {}-{}", unit.start_line, unit.end_line),
            })
            .collect();
        let states: Vec<_> = unit_states(&file, self.config.incremental.retains_source())
            .into_iter()
            .filter(|s| !failed.contains(s.name.as_str()))
            .collect();
        let mut ids: Vec<String> = states.iter().map(|s| s.fingerprint.id.clone()).collect();
        let mut carried = 0;

        let (records, units, fingerprints) = match self.granularity() {
            Granularity::File => {
                let mut records = Vec::with_capacity(file.units.len());
                for unit in &file.units {
                    if !unit.has_error {
                        records.push(builder.build(&file, unit));
                    } else if let Some(old) = store.get(&file.path, &unit.identifier(&file.path)) {
                        ids.push(old.id.clone());
                        records.push(old.clone());
                        carried += 1;
                    }
                }
                (records, None, None)
            }
            Granularity::Unit => {
                // Failed units keep their old fingerprint and stay out of the diff.
                let mut prior = previous.and_then(|m| m.unit_fingerprints(&file.path)).cloned();
                let kept: BTreeMap<String, UnitFingerprint> = match prior.as_mut() {
                    Some(prior) => failed.iter().filter_map(|key| prior.remove_entry(*key)).collect(),
                    None => BTreeMap::new(),
                };
                let report = diff_units(&file.path, prior.as_ref(), &states, &self.config.incremental);
                let records = {
                    let mut fresh: HashSet<&str> = report.fresh_ids().into_iter().collect();
                    // An unchanged unit whose record went missing is re-derived.
                    for unit in &report.unchanged {
                        if store.get(&file.path, &unit.fingerprint.id).is_none() {
                            fresh.insert(unit.fingerprint.id.as_str());
                        }
                    }
                    build_selected(&builder, &file, &fresh)
                };
                ids.extend(kept.values().map(|fp| fp.id.clone()));
                let fingerprints = states
                    .into_iter()
                    .map(|s| (s.name, s.fingerprint))
                    .chain(kept)
                    .collect();
                (records, Some(report), Some(fingerprints))
            }
        };

        debug!(
            "{}: {} units, {} records to write, {} failed",
            file.path,
            file.units.len(),
            records.len(),
            failures.len()
        );

        FileAnalysis {
            entry: FileEntry {
                hash,
                size,
                last_modified: scanned.last_modified,
                units: ids,
                unit_fingerprints: fingerprints,
            },
            update: AnalyzedFile {
                path: file.path,
                records,
                units,
            },
            failures,
            carried,
        }
    }

    /// Manifest for the new state: fresh entries for analyzed files, prior
    /// entries for unchanged files and for files that failed to parse.
    fn next_manifest(
        &self,
        changes: &ChangeReport,
        previous: Option<&Manifest>,
        mut entries: BTreeMap<String, FileEntry>,
        store: &GraphStore,
        mode: RunMode,
    ) -> Manifest {
        let mut manifest = Manifest::new(self.granularity(), self.algorithm());
        for (path, scanned) in &changes.current {
            if let Some(entry) = entries.remove(path) {
                manifest.files.insert(path.clone(), entry);
            } else if let Some(old) = previous.and_then(|m| m.file(path)) {
                let mut entry = old.clone();
                if entry.hash == scanned.hash {
                    entry.last_modified = scanned.last_modified;
                }
                manifest.files.insert(path.clone(), entry);
            }
        }
        manifest.global_stats = GlobalStats {
            total_files: manifest.files.len(),
            total_units: manifest.total_units(),
            total_records: store.len(),
            last_run: mode,
        };
        manifest
    }

    fn dependency_stats(&self, store: &GraphStore) -> Option<DependencyStats> {
        if !self.config.analysis.track_dependencies {
            return None;
        }
        let graph = DependencyGraph::build(store.records());
        Some(DependencyStats {
            units: graph.node_count(),
            edges: graph.edge_count(),
            cycles: graph.detect_cycles().len(),
            entry_points: graph
                .find_entry_points(self.config.analysis.entry_point_max_callers)
                .len(),
            leaves: graph.find_leaves().len(),
        })
    }
}

/// Read a stale file and extract it, hashing the exact bytes parsed.
fn read_and_extract(
    registry: &mut ParserRegistry,
    scanned: &ScannedFile,
) -> Result<ParsedFile, ParseError> {
    let content = std::fs::read(&scanned.abs_path).map_err(|source| ParseError::Read {
        path: scanned.path.clone(),
        source,
    })?;
    let hash = registry.algorithm().digest(&content);
    if hash != scanned.hash {
        debug!("{} changed after the scan, analyzing the newer content", scanned.path);
    }
    let file = registry.extract(&scanned.path, scanned.language, &content)?;
    Ok(ParsedFile {
        hash,
        size: content.len() as u64,
        file,
    })
}

fn build_selected(
    builder: &RecordBuilder<'_>,
    file: &ExtractedFile,
    ids: &HashSet<&str>,
) -> Vec<GraphRecord> {
    file.units
        .iter()
        .filter(|unit| ids.contains(unit.identifier(&file.path).as_str()))
        .map(|unit| builder.build(file, unit))
        .collect()
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(root)
        .ok()
        .filter(|path| path.is_dir())
        .ok_or_else(|| EngineError::Walk(WalkError::RootMissing(root.to_path_buf())))
}
