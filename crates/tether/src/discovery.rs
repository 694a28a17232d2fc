//! Finding plugin modules on disk.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::DiscoveryError;
use crate::paths::SearchPath;

/// True if `path` has this platform's shared-library extension.
pub fn is_plugin_file(path: &Path) -> bool {
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) if cfg!(target_os = "macos") => ext == "dylib",
        Some(ext) if cfg!(target_os = "windows") => ext == "dll",
        Some(ext) => ext == "so",
        None => false,
    }
}

/// Expand a search path into module files.
///
/// Files named directly are kept as-is. Directories contribute their
/// shared libraries (not recursively), sorted by name. Missing entries are
/// skipped.
pub fn discover(search: &SearchPath) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut found = Vec::new();
    for entry in search.entries() {
        if entry.is_file() {
            found.push(entry.clone());
            continue;
        }
        if !entry.is_dir() {
            debug!(path = %entry.display(), "plugin path does not exist, skipping");
            continue;
        }

        let read = fs::read_dir(entry).map_err(|source| DiscoveryError::ReadDir {
            path: entry.clone(),
            source,
        })?;
        let mut libs: Vec<PathBuf> = read
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_plugin_file(p))
            .collect();
        libs.sort();
        debug!(dir = %entry.display(), count = libs.len(), "discovered plugins");
        found.extend(libs);
    }
    Ok(found)
}
