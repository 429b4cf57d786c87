//! Test utilities for arbor-incremental

use std::fs;
use std::path::Path;

use arbor_core::{
    ArborConfig, Granularity, GraphStore, IncrementalConfig, Manifest, ManifestStore, graph_path,
};
use tempfile::TempDir;

use crate::engine::Engine;

/// A throwaway source tree.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.root().join(relative)).unwrap();
    }

    pub fn graph(&self) -> GraphStore {
        GraphStore::load(&graph_path(self.root())).unwrap().unwrap()
    }

    /// Raw graph store lines, as written.
    pub fn graph_lines(&self) -> Vec<String> {
        fs::read_to_string(graph_path(self.root()))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn manifest(&self) -> Manifest {
        ManifestStore::new(self.root()).read().unwrap().unwrap()
    }
}

pub fn engine(granularity: Granularity) -> Engine {
    Engine::new(ArborConfig {
        granularity,
        ..ArborConfig::default()
    })
    .unwrap()
}

pub fn engine_with_renames(detect_renames: bool) -> Engine {
    Engine::new(ArborConfig {
        granularity: Granularity::Unit,
        incremental: IncrementalConfig {
            detect_renames,
            similarity_threshold: 0.85,
            ..IncrementalConfig::default()
        },
        ..ArborConfig::default()
    })
    .unwrap()
}

/// A JavaScript module with `helpers` helper functions followed by
/// `validateEmail`, whose body depends on `strict`.
pub fn accounts_module(helpers: usize, strict: bool) -> String {
    let mut source = String::new();
    for i in 0..helpers {
        source.push_str(&format!(
            "function helper{i}(value) {{\n  return validateEmail(value) ? {i} : -1;\n}}\n\n"
        ));
    }
    let check = if strict {
        "email.indexOf(\"@\") > 0 && email.trim().length > 3"
    } else {
        "email.indexOf(\"@\") > 0"
    };
    source.push_str(&format!(
        "function validateEmail(email) {{\n  return {check};\n}}\n"
    ));
    source
}
