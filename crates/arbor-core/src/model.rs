//! Core data structures shared by the change detectors, the updater, and the stores

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::manifest::UnitFingerprint;

/// Languages the parser layer can turn into analysis units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
}

impl Language {
    /// Detect language from file extension. Untracked extensions yield `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str())? {
            "rs" => Some(Language::Rust),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "py" | "pyi" => Some(Language::Python),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }
}

/// Turn an absolute path under `root` into the forward-slash key used in
/// the manifest and the graph store.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// One analysis unit's result, stored as one line of the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub id: String,
    pub name: String,
    pub file: String,
    pub line: u32,
    pub signature: String,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub calls: Vec<String>,
    pub effects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    pub lang: Language,
}

impl GraphRecord {
    /// Name under which the record joins the dependency graph. Anonymous
    /// units share a placeholder name, so they are keyed by identifier.
    pub fn node_name(&self) -> &str {
        if self.tags.iter().any(|t| t == "anonymous") {
            &self.id
        } else {
            &self.name
        }
    }

    /// Whether this record is keyed by `(file, id)`.
    pub fn is_keyed(&self, file: &str, id: &str) -> bool {
        self.file == file && self.id == id
    }
}

/// A file found by the tree walk, hashed but not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: String,
    pub abs_path: PathBuf,
    pub language: Language,
    pub hash: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A file whose content hash differs from the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub old_hash: String,
    pub new_hash: String,
    pub old_size: u64,
    pub new_size: u64,
}

impl FileChange {
    pub fn size_delta(&self) -> i64 {
        self.new_size as i64 - self.old_size as i64
    }
}

/// File-granularity classification of every tracked path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    pub added: Vec<String>,
    pub modified: Vec<FileChange>,
    pub deleted: Vec<String>,
    pub unchanged: Vec<String>,
    /// Current state of every scanned file, keyed by path.
    pub current: BTreeMap<String, ScannedFile>,
}

impl ChangeReport {
    /// True when nothing was added, modified, or deleted.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Paths that must be re-analyzed: added and modified, in path order.
    pub fn stale_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .added
            .iter()
            .map(String::as_str)
            .chain(self.modified.iter().map(|m| m.path.as_str()))
            .collect();
        paths.sort_unstable();
        paths
    }

    pub fn is_modified(&self, path: &str) -> bool {
        self.modified.iter().any(|m| m.path == path)
    }
}

/// A unit as seen in one pass: its manifest key plus fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitState {
    pub name: String,
    pub fingerprint: UnitFingerprint,
}

/// A unit whose normalized hash changed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDelta {
    pub name: String,
    pub old: UnitFingerprint,
    pub new: UnitFingerprint,
}

impl UnitDelta {
    pub fn size_delta(&self) -> i64 {
        self.new.size as i64 - self.old.size as i64
    }

    pub fn line_shift(&self) -> i64 {
        self.new.line as i64 - self.old.line as i64
    }
}

/// A deleted/added pair matched by source similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRename {
    pub old_name: String,
    pub new_name: String,
    pub old: UnitFingerprint,
    pub new: UnitFingerprint,
    pub similarity: f64,
}

/// Unit-granularity classification for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitChangeReport {
    pub file: String,
    pub added: Vec<UnitState>,
    pub modified: Vec<UnitDelta>,
    pub deleted: Vec<UnitState>,
    pub unchanged: Vec<UnitState>,
    pub renamed: Vec<UnitRename>,
    /// False when no prior per-unit fingerprints existed for the file.
    pub has_baseline: bool,
}

impl UnitChangeReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
    }

    /// Identifiers whose graph records must be removed.
    pub fn stale_ids(&self) -> Vec<&str> {
        self.modified
            .iter()
            .map(|d| d.old.id.as_str())
            .chain(self.deleted.iter().map(|u| u.fingerprint.id.as_str()))
            .chain(self.renamed.iter().map(|r| r.old.id.as_str()))
            .collect()
    }

    /// Identifiers whose graph records must be derived afresh.
    pub fn fresh_ids(&self) -> Vec<&str> {
        self.modified
            .iter()
            .map(|d| d.new.id.as_str())
            .chain(self.added.iter().map(|u| u.fingerprint.id.as_str()))
            .chain(self.renamed.iter().map(|r| r.new.id.as_str()))
            .collect()
    }
}
