//! Integration tests for Arbor
//!
//! These tests drive a whole analysis pass over a temporary repository and
//! query the resulting graph through the public crates.

use std::fs;
use std::path::Path;

use arbor_core::{
    DependencyGraph, Granularity, GraphStore, ManifestStore, RunMode, config_path, ensure_config,
    graph_path, load_config,
};
use arbor_incremental::Engine;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn graph(root: &Path) -> DependencyGraph {
    let store = GraphStore::load(&graph_path(root)).unwrap().unwrap();
    DependencyGraph::build(store.records())
}

/// A small service split across three languages.
fn sample_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "api/server.py",
        "import requests\n\ndef main():\n    handle_request({})\n\ndef handle_request(req):\n    user = load_user(req)\n    return render(user)\n\ndef render(user):\n    return str(user)\n",
    );
    write(
        root,
        "api/db.py",
        "import sqlite3\n\ndef load_user(req):\n    conn = sqlite3.connect('app.db')\n    return conn.execute('select 1')\n",
    );
    write(
        root,
        "web/app.js",
        "function boot() {\n  renderPage();\n}\n\nfunction renderPage() {\n  console.log('page');\n}\n",
    );
    write(root, "node_modules/dep/index.js", "function ignored() {}\n");
    dir
}

#[test]
fn test_analyze_and_query_impact() {
    let dir = sample_repo();
    let root = dir.path();

    let summary = Engine::for_root(root).unwrap().run(root).unwrap();
    assert_eq!(summary.mode, RunMode::Full);
    assert_eq!(summary.files_added, 3);
    assert!(summary.failures.is_empty());

    let graph = graph(root);
    assert!(!graph.contains("ignored"));
    assert_eq!(graph.dependencies("handle_request"), vec!["load_user", "render"]);

    let impact = graph.impact_report("load_user", 10);
    assert_eq!(
        impact.affected.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["handle_request", "main"]
    );
    assert_eq!(impact.by_depth, vec![vec!["handle_request"], vec!["main"]]);
    assert!(graph.impact_set("load_user", 1).contains("handle_request"));
    assert!(!graph.impact_set("load_user", 1).contains("main"));

    assert!(graph.find_leaves().contains(&"render".to_string()));
    assert!(graph.detect_cycles().is_empty());
}

#[test]
fn test_effects_reach_graph_store() {
    let dir = sample_repo();
    let root = dir.path();
    Engine::for_root(root).unwrap().run(root).unwrap();

    let store = GraphStore::load(&graph_path(root)).unwrap().unwrap();
    let load_user = store.get("api/db.py", "api/db.py#load_user").unwrap();
    assert_eq!(load_user.effects, vec!["database"]);
    let render_page = store.get("web/app.js", "web/app.js#renderPage").unwrap();
    assert_eq!(render_page.effects, vec!["logging"]);
    let main = store.get("api/server.py", "api/server.py#main").unwrap();
    assert!(main.tags.contains(&"entry".to_string()));
}

#[test]
fn test_cycle_introduced_across_files() {
    let dir = sample_repo();
    let root = dir.path();
    let engine = Engine::for_root(root).unwrap();
    engine.run(root).unwrap();

    write(
        root,
        "api/server.py",
        "import requests\n\ndef main():\n    handle_request({})\n\ndef handle_request(req):\n    user = load_user(req)\n    return render(user)\n\ndef render(user):\n    return handle_request(user)\n",
    );
    let summary = engine.run(root).unwrap();
    assert_eq!(summary.mode, RunMode::Incremental);
    assert_eq!(summary.files_modified, 1);
    assert_eq!(summary.files_unchanged, 2);

    let cycles = graph(root).detect_cycles();
    assert_eq!(cycles.len(), 1);
    let cycle = &cycles[0];
    assert_eq!(cycle.first(), cycle.last());
    assert!(cycle.contains(&"handle_request".to_string()));
    assert!(cycle.contains(&"render".to_string()));
}

#[test]
fn test_config_file_selects_unit_granularity() {
    let dir = sample_repo();
    let root = dir.path();
    ensure_config(root).unwrap();
    let raw = fs::read_to_string(config_path(root)).unwrap();
    fs::write(config_path(root), raw.replace("granularity = \"file\"", "granularity = \"unit\"")).unwrap();

    let config = load_config(root).unwrap();
    assert_eq!(config.granularity, Granularity::Unit);

    let engine = Engine::for_root(root).unwrap();
    engine.run(root).unwrap();
    let manifest = ManifestStore::new(root).read().unwrap().unwrap();
    assert_eq!(manifest.granularity, Granularity::Unit);
    assert_eq!(manifest.unit_fingerprints("api/server.py").unwrap().len(), 3);

    write(
        root,
        "api/server.py",
        "import requests\n\ndef main():\n    handle_request({})\n\ndef handle_request(req):\n    user = load_user(req)\n    return render(user)\n\ndef render(user):\n    return repr(user)\n",
    );
    let summary = engine.run(root).unwrap();
    assert_eq!(summary.units_reanalyzed, 1);
    assert_eq!(summary.unit_changes[0].modified[0].name, "render");
}

#[test]
fn test_arborignore_excludes_paths() {
    let dir = sample_repo();
    let root = dir.path();
    write(root, ".arborignore", "web/\n");

    let summary = Engine::for_root(root).unwrap().run(root).unwrap();
    assert_eq!(summary.files_added, 2);
    assert!(!graph(root).contains("boot"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = sample_repo();
    let root = dir.path();
    write(root, ".arbor/config.toml", "[incremental]\nsimilarityThreshold = 1.5\n");

    assert!(Engine::for_root(root).is_err());
    assert!(!graph_path(root).exists());
}
