//! Incremental recomputation: change detection, unit diffing, graph splicing,
//! and the engine that runs one analysis pass

pub mod changes;
pub mod engine;
pub mod error;
pub mod similarity;
pub mod units;
pub mod updater;

#[cfg(test)]
pub mod test_utils;

pub use changes::{ChangeDetector, compare};
pub use engine::{DependencyStats, Engine, RunSummary, StatusReport, UnitFailure};
pub use error::EngineError;
pub use similarity::similarity;
pub use units::{diff_units, unit_states};
pub use updater::{AnalyzedFile, GraphUpdater, UpdateStats};
