//! Unit-level change detection with optional rename matching

use std::collections::{BTreeMap, HashSet};

use arbor_core::{IncrementalConfig, UnitChangeReport, UnitDelta, UnitFingerprint, UnitRename, UnitState};
use arbor_indexer::ExtractedFile;
use tracing::debug;

use crate::similarity::similarity;

/// Fingerprints of every unit in `file`, in source order.
pub fn unit_states(file: &ExtractedFile, retain_source: bool) -> Vec<UnitState> {
    file.units
        .iter()
        .map(|unit| UnitState {
            name: unit.key.clone(),
            fingerprint: UnitFingerprint {
                id: unit.identifier(&file.path),
                hash: unit.hash.clone(),
                line: unit.start_line,
                end_line: unit.end_line,
                size: unit.byte_size,
                is_async: unit.is_async,
                source: retain_source.then(|| unit.source.clone()),
            },
        })
        .collect()
}

/// Diff the current units of `file` against its prior fingerprints.
///
/// Without prior fingerprints every current unit is added. Otherwise units
/// are matched by name; when rename detection is on, each deleted unit is
/// paired with the most similar unmatched added unit at or above the
/// threshold. Only deleted/added pairs are compared, so two live units with
/// identical bodies are never a rename.
pub fn diff_units(
    file: &str,
    prior: Option<&BTreeMap<String, UnitFingerprint>>,
    current: &[UnitState],
    config: &IncrementalConfig,
) -> UnitChangeReport {
    let mut report = UnitChangeReport {
        file: file.to_string(),
        ..Default::default()
    };

    let Some(prior) = prior else {
        report.added = current.to_vec();
        return report;
    };
    report.has_baseline = true;

    let current_names: HashSet<&str> = current.iter().map(|u| u.name.as_str()).collect();
    for unit in current {
        match prior.get(&unit.name) {
            None => report.added.push(unit.clone()),
            Some(old) if old.hash != unit.fingerprint.hash => report.modified.push(UnitDelta {
                name: unit.name.clone(),
                old: old.clone(),
                new: unit.fingerprint.clone(),
            }),
            Some(_) => report.unchanged.push(unit.clone()),
        }
    }
    // Prior order is name order; sort deletions by their old position.
    let mut deleted: Vec<UnitState> = prior
        .iter()
        .filter(|(name, _)| !current_names.contains(name.as_str()))
        .map(|(name, fingerprint)| UnitState {
            name: name.clone(),
            fingerprint: fingerprint.clone(),
        })
        .collect();
    deleted.sort_by_key(|u| u.fingerprint.line);
    report.deleted = deleted;

    if config.detect_renames {
        match_renames(&mut report, config.similarity_threshold);
    }

    debug!(
        "{}: {} added, {} modified, {} deleted, {} renamed, {} unchanged units",
        file,
        report.added.len(),
        report.modified.len(),
        report.deleted.len(),
        report.renamed.len(),
        report.unchanged.len()
    );
    report
}

/// Greedy pairing: deleted units in position order each take their best
/// remaining candidate. Units without stored source cannot be matched.
fn match_renames(report: &mut UnitChangeReport, threshold: f64) {
    let mut taken = vec![false; report.added.len()];
    let mut remaining_deleted = Vec::new();

    for old in std::mem::take(&mut report.deleted) {
        let Some(old_source) = old.fingerprint.source.as_deref() else {
            remaining_deleted.push(old);
            continue;
        };

        let mut best: Option<(usize, f64)> = None;
        for (index, new) in report.added.iter().enumerate() {
            if taken[index] {
                continue;
            }
            let Some(new_source) = new.fingerprint.source.as_deref() else {
                continue;
            };
            let score = similarity(old_source, new_source);
            if score >= threshold && best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) => {
                taken[index] = true;
                let new = &report.added[index];
                debug!(
                    "Rename {} -> {} ({:.2} similar)",
                    old.name, new.name, score
                );
                report.renamed.push(UnitRename {
                    old_name: old.name,
                    new_name: new.name.clone(),
                    old: old.fingerprint,
                    new: new.fingerprint.clone(),
                    similarity: score,
                });
            }
            None => remaining_deleted.push(old),
        }
    }

    report.deleted = remaining_deleted;
    let mut index = 0;
    report.added.retain(|_| {
        let keep = !taken[index];
        index += 1;
        keep
    });
}
