//! Tree walker: enumerates tracked source files under a root
//!
//! Applies the default ignore list, the root `.gitignore`, the configured
//! ignore file, and any extra patterns. Symbolic links are not followed.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use arbor_core::{CACHE_DIR, Language, ScanConfig, relative_key};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

use crate::error::WalkError;

/// Directory names skipped wherever they appear.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    CACHE_DIR,
    "node_modules",
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "__pycache__",
    ".pytest_cache",
    "coverage",
    ".nyc_output",
    "vendor",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
];

/// A tracked file found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub path: String,
    pub abs_path: PathBuf,
    pub language: Language,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

pub struct TreeWalker {
    root: PathBuf,
    defaults: GlobSet,
    ignores: Gitignore,
    max_file_size: u64,
}

impl TreeWalker {
    pub fn new(root: &Path, config: &ScanConfig) -> Result<Self, WalkError> {
        if !root.is_dir() {
            return Err(WalkError::RootMissing(root.to_path_buf()));
        }

        let mut defaults = GlobSetBuilder::new();
        for name in DEFAULT_IGNORES {
            defaults.add(Glob::new(&format!("**/{name}"))?);
        }

        let mut builder = GitignoreBuilder::new(root);
        for file in [root.join(".gitignore"), root.join(&config.ignore_file)] {
            if file.is_file() {
                if let Some(e) = builder.add(&file) {
                    warn!("Problem reading {}: {}", file.display(), e);
                }
            }
        }
        for pattern in &config.extra_ignores {
            builder.add_line(None, pattern)?;
        }

        Ok(Self {
            root: root.to_path_buf(),
            defaults: defaults.build()?,
            ignores: builder.build()?,
            max_file_size: config.max_file_size,
        })
    }

    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        (is_dir && self.defaults.is_match(relative))
            || self.ignores.matched_path_or_any_parents(path, is_dir).is_ignore()
    }

    /// Every tracked file under the root, sorted by key.
    pub fn walk(&self) -> Vec<WalkedFile> {
        let mut files = Vec::new();
        let mut queue = VecDeque::from([self.root.clone()]);

        while let Some(dir) = queue.pop_front() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };

                if file_type.is_dir() {
                    if !self.is_ignored(&path, true) {
                        queue.push_back(path);
                    }
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }
                let Some(language) = Language::from_path(&path) else {
                    continue;
                };
                if self.is_ignored(&path, false) {
                    continue;
                }

                let metadata = match entry.metadata() {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        continue;
                    }
                };
                if metadata.len() > self.max_file_size {
                    debug!(
                        "Skipping {} ({} bytes exceeds limit)",
                        path.display(),
                        metadata.len()
                    );
                    continue;
                }

                files.push(WalkedFile {
                    path: relative_key(&self.root, &path),
                    abs_path: path,
                    language,
                    size: metadata.len(),
                    last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Walked {} tracked files under {}", files.len(), self.root.display());
        files
    }
}
