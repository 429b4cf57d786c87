//! CLI command implementations

use anyhow::{Context, bail};
use arbor_core::{ArborConfig, DependencyGraph, Granularity, GraphStore, RunMode, graph_path};
use arbor_incremental::{Engine, RunSummary};
use std::path::Path;

fn load_config(root: &Path, init: bool) -> anyhow::Result<ArborConfig> {
    let config = if init {
        arbor_core::ensure_config(root)
    } else {
        arbor_core::load_config(root)
    };
    config.with_context(|| format!("Failed to load configuration under {}", root.display()))
}

fn load_graph(root: &Path) -> anyhow::Result<DependencyGraph> {
    let path = graph_path(root);
    let Some(store) = GraphStore::load(&path)
        .with_context(|| format!("Failed to read graph store {}", path.display()))?
    else {
        bail!("No graph store at {}; run `arbor analyze` first", path.display());
    };
    Ok(DependencyGraph::build(store.records()))
}

fn mode_label(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Full => "full",
        RunMode::Incremental => "incremental",
    }
}

pub fn analyze(root: &Path, init: bool, granularity: Option<Granularity>) -> anyhow::Result<()> {
    let mut config = load_config(root, init)?;
    if let Some(granularity) = granularity {
        config.granularity = granularity;
    }

    let engine = Engine::new(config).context("Invalid configuration")?;
    let summary = engine
        .run(root)
        .with_context(|| format!("Analysis of {} failed", root.display()))?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} run ({} granularity) in {:.2?}",
        mode_label(summary.mode),
        summary.granularity.as_str(),
        summary.elapsed
    );
    println!(
        "  files: {} added, {} modified, {} deleted, {} unchanged",
        summary.files_added, summary.files_modified, summary.files_deleted, summary.files_unchanged
    );
    println!(
        "  units: {} re-analyzed, {} retained, {} removed",
        summary.units_reanalyzed, summary.units_retained, summary.records_removed
    );
    for rename in &summary.renames {
        println!(
            "  renamed: {} -> {} ({:.0}% similar)",
            rename.old.id,
            rename.new.id,
            rename.similarity * 100.0
        );
    }
    for failure in &summary.failures {
        println!("  failed: {failure}");
    }
    if let Some(deps) = &summary.dependencies {
        println!(
            "  graph: {} units, {} edges, {} cycles, {} entry points, {} leaves",
            deps.units, deps.edges, deps.cycles, deps.entry_points, deps.leaves
        );
    }
    if !summary.written {
        println!("  up to date, nothing written");
    }
}

pub fn status(root: &Path) -> anyhow::Result<()> {
    let engine = Engine::new(load_config(root, false)?).context("Invalid configuration")?;
    let report = engine
        .status(root)
        .with_context(|| format!("Change detection in {} failed", root.display()))?;

    println!("next run: {}", mode_label(report.mode));
    if let Some(last) = &report.last_run {
        println!(
            "last run: {} ({} files, {} units, {} records)",
            mode_label(last.last_run),
            last.total_files,
            last.total_units,
            last.total_records
        );
    }
    for path in &report.changes.added {
        println!("  A {path}");
    }
    for change in &report.changes.modified {
        println!("  M {} ({:+} bytes)", change.path, change.size_delta());
    }
    for path in &report.changes.deleted {
        println!("  D {path}");
    }
    println!("{} unchanged", report.changes.unchanged.len());
    Ok(())
}

pub fn impact(root: &Path, name: &str, depth: Option<usize>) -> anyhow::Result<()> {
    let config = load_config(root, false)?;
    let graph = load_graph(root)?;
    if !graph.contains(name) {
        bail!("Unknown unit '{name}'");
    }

    let report = graph.impact_report(name, depth.unwrap_or(config.analysis.max_call_depth));
    println!(
        "{} units affected by a change to {} (depth {})",
        report.affected.len(),
        report.target,
        report.max_depth
    );
    for (hop, names) in report.by_depth.iter().enumerate() {
        println!("  {}: {}", hop + 1, names.join(", "));
    }
    Ok(())
}

pub fn cycles(root: &Path) -> anyhow::Result<()> {
    let graph = load_graph(root)?;
    let cycles = graph.detect_cycles();
    if cycles.is_empty() {
        println!("No cycles");
    }
    for cycle in cycles {
        println!("{}", cycle.join(" -> "));
    }
    Ok(())
}

pub fn entry_points(root: &Path, max_callers: Option<usize>) -> anyhow::Result<()> {
    let config = load_config(root, false)?;
    let graph = load_graph(root)?;
    let max_callers = max_callers.unwrap_or(config.analysis.entry_point_max_callers);
    for name in graph.find_entry_points(max_callers) {
        println!("{name}");
    }
    Ok(())
}

pub fn leaves(root: &Path) -> anyhow::Result<()> {
    let graph = load_graph(root)?;
    for name in graph.find_leaves() {
        println!("{name}");
    }
    Ok(())
}

pub fn clear(root: &Path) -> anyhow::Result<()> {
    tracing::info!("Clearing analysis state for: {}", root.display());
    Engine::clear(root).with_context(|| format!("Failed to clear {}", root.display()))?;
    Ok(())
}
