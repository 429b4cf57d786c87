//! Unit tests for arbor-core module

use crate::*;
use std::path::{Path, PathBuf};

fn fingerprint(id: &str, hash: &str, line: u32, size: u64) -> UnitFingerprint {
    UnitFingerprint {
        id: id.to_string(),
        hash: hash.to_string(),
        line,
        end_line: line + 3,
        size,
        is_async: false,
        source: None,
    }
}

#[test]
fn test_language_detection() {
    let test_cases = vec![
        ("test.rs", Some(Language::Rust)),
        ("main.ts", Some(Language::TypeScript)),
        ("view.tsx", Some(Language::Tsx)),
        ("app.js", Some(Language::JavaScript)),
        ("app.mjs", Some(Language::JavaScript)),
        ("lib.py", Some(Language::Python)),
        ("main.go", Some(Language::Go)),
        ("Main.java", Some(Language::Java)),
        ("main.c", Some(Language::C)),
        ("util.h", Some(Language::C)),
        ("main.cpp", Some(Language::Cpp)),
        ("config.yml", None),
        ("Makefile", None),
    ];

    for (filename, expected) in test_cases {
        let path = PathBuf::from(filename);
        assert_eq!(Language::from_path(&path), expected, "Failed for {}", filename);
    }
}

#[test]
fn test_relative_key_uses_forward_slashes() {
    let root = Path::new("/repo");
    let path = root.join("src").join("nested").join("mod.rs");
    assert_eq!(relative_key(root, &path), "src/nested/mod.rs");
    assert_eq!(relative_key(root, Path::new("/elsewhere/x.rs")), "elsewhere/x.rs");
}

#[test]
fn test_stale_paths_are_sorted() {
    let report = ChangeReport {
        added: vec!["z.py".to_string(), "b.py".to_string()],
        modified: vec![FileChange {
            path: "m.py".to_string(),
            old_hash: "1".to_string(),
            new_hash: "2".to_string(),
            old_size: 10,
            new_size: 14,
        }],
        deleted: vec!["gone.py".to_string()],
        unchanged: vec!["same.py".to_string()],
        current: Default::default(),
    };

    assert!(!report.is_empty());
    assert_eq!(report.stale_paths(), vec!["b.py", "m.py", "z.py"]);
    assert!(report.is_modified("m.py"));
    assert!(!report.is_modified("z.py"));
    assert_eq!(report.modified[0].size_delta(), 4);
}

#[test]
fn test_unit_report_ids() {
    let report = UnitChangeReport {
        file: "a.js".to_string(),
        added: vec![UnitState {
            name: "fresh".to_string(),
            fingerprint: fingerprint("a.js#fresh", "h1", 20, 40),
        }],
        modified: vec![UnitDelta {
            name: "edited".to_string(),
            old: fingerprint("a.js#edited", "h2", 5, 50),
            new: fingerprint("a.js#edited", "h3", 7, 45),
        }],
        deleted: vec![UnitState {
            name: "gone".to_string(),
            fingerprint: fingerprint("a.js#gone", "h4", 30, 10),
        }],
        unchanged: Vec::new(),
        renamed: vec![UnitRename {
            old_name: "foo".to_string(),
            new_name: "bar".to_string(),
            old: fingerprint("a.js#foo", "h5", 40, 60),
            new: fingerprint("a.js#bar", "h6", 40, 60),
            similarity: 0.95,
        }],
        has_baseline: true,
    };

    assert_eq!(report.stale_ids(), vec!["a.js#edited", "a.js#gone", "a.js#foo"]);
    assert_eq!(report.fresh_ids(), vec!["a.js#edited", "a.js#fresh", "a.js#bar"]);
    assert_eq!(report.modified[0].size_delta(), -5);
    assert_eq!(report.modified[0].line_shift(), 2);
}

#[test]
fn test_dependency_graph_from_store() {
    let store = GraphStore::from_records(vec![
        GraphRecord {
            id: "a.go#Serve".to_string(),
            name: "Serve".to_string(),
            file: "a.go".to_string(),
            line: 3,
            signature: "Serve(addr string)".to_string(),
            is_async: false,
            calls: vec!["handle".to_string(), "log.Printf".to_string()],
            effects: vec!["logging".to_string()],
            tags: Vec::new(),
            patterns: Vec::new(),
            lang: Language::Go,
        },
        GraphRecord {
            id: "b.go#handle".to_string(),
            name: "handle".to_string(),
            file: "b.go".to_string(),
            line: 8,
            signature: "handle(w, r)".to_string(),
            is_async: false,
            calls: Vec::new(),
            effects: Vec::new(),
            tags: Vec::new(),
            patterns: Vec::new(),
            lang: Language::Go,
        },
    ]);

    let graph = DependencyGraph::build(store.records());
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.dependencies("Serve"), vec!["handle"]);
    assert_eq!(graph.dependents("handle"), vec!["Serve"]);
    assert_eq!(graph.find_leaves(), vec!["handle"]);
}
