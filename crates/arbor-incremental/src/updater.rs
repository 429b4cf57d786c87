//! Incremental graph updater: splices fresh records into the graph store

use std::collections::{HashMap, HashSet};

use arbor_core::{Granularity, GraphRecord, GraphStore, UnitChangeReport};
use tracing::debug;

/// Fresh analysis of one stale file.
#[derive(Debug, Clone)]
pub struct AnalyzedFile {
    pub path: String,
    /// Under file granularity, every unit of the file. Under unit granularity,
    /// only the units that had to be re-derived.
    pub records: Vec<GraphRecord>,
    /// Present under unit granularity.
    pub units: Option<UnitChangeReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub removed: usize,
    pub inserted: usize,
}

pub struct GraphUpdater {
    granularity: Granularity,
}

impl GraphUpdater {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// Remove stale records and append fresh ones. Files absent from
    /// `analyzed` and `deleted` are not touched, including files whose
    /// analysis failed. Removal is a single pass over the store.
    pub fn apply(
        &self,
        store: &mut GraphStore,
        deleted: &[String],
        analyzed: Vec<AnalyzedFile>,
    ) -> UpdateStats {
        let removed = {
            let mut whole: HashSet<&str> = deleted.iter().map(String::as_str).collect();
            let mut partial: HashMap<&str, HashSet<&str>> = HashMap::new();

            for file in &analyzed {
                match (self.granularity, &file.units) {
                    (Granularity::Unit, Some(units)) if units.has_baseline => {
                        let stale = partial.entry(file.path.as_str()).or_default();
                        stale.extend(units.stale_ids());
                        // Re-derived records replace any copy already present.
                        stale.extend(file.records.iter().map(|r| r.id.as_str()));
                    }
                    _ => {
                        whole.insert(file.path.as_str());
                    }
                }
            }

            store.retain(|r| {
                !(whole.contains(r.file.as_str())
                    || partial
                        .get(r.file.as_str())
                        .is_some_and(|ids| ids.contains(r.id.as_str())))
            })
        };

        let mut inserted = 0;
        for file in analyzed {
            debug!("{}: inserting {} records", file.path, file.records.len());
            inserted += file.records.len();
            for record in file.records {
                store.insert(record);
            }
        }

        UpdateStats { removed, inserted }
    }
}
