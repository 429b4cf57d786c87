//! On-disk layout of the analysis state

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// State directory: .arbor/
pub const CACHE_DIR: &str = ".arbor";

/// Fingerprint store
pub const MANIFEST_FILE: &str = "manifest.json";

/// Graph store, one record per line
pub const GRAPH_FILE: &str = "graph.jsonl";

/// Engine configuration
pub const CONFIG_FILE: &str = "config.toml";

pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(CACHE_DIR)
}

pub fn manifest_path(root: &Path) -> PathBuf {
    cache_dir(root).join(MANIFEST_FILE)
}

pub fn graph_path(root: &Path) -> PathBuf {
    cache_dir(root).join(GRAPH_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    cache_dir(root).join(CONFIG_FILE)
}

/// Ensure state directory exists
pub fn ensure_cache_dir(root: &Path) -> Result<()> {
    let dir = cache_dir(root);
    std::fs::create_dir_all(&dir).map_err(Error::io(&dir))
}

/// Write `contents` next to `path` and rename over it, so readers never
/// observe a half-written artifact.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(Error::io(parent))?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).map_err(Error::io(&tmp))?;
    std::fs::rename(&tmp, path).map_err(Error::io(path))?;
    tracing::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Remove the manifest and graph store. The config file is kept.
pub fn clear_cache(root: &Path) -> Result<()> {
    for path in [manifest_path(root), graph_path(root)] {
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io { path, source: e }),
        }
    }
    Ok(())
}
