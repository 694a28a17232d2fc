//! Plugin search-path configuration.

use dirs::data_dir;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// OS path list (`:` or `;` separated) of plugin files and directories.
pub const ENV_PLUGIN_PATH: &str = "TETHER_PLUGIN_PATH";

/// ~/.local/share/Tether   (or platform-equivalent)
pub fn tether_home() -> PathBuf {
    data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("Tether")
}

/// ~/.local/share/Tether/plugins
pub fn plugins_dir() -> PathBuf {
    tether_home().join("plugins")
}

/// Where to look for plugin modules, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// `$TETHER_PLUGIN_PATH`, or the default plugins directory when unset.
    pub fn from_env() -> Self {
        Self::from_env_value(env::var_os(ENV_PLUGIN_PATH))
    }

    pub(crate) fn from_env_value(value: Option<OsString>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::new(env::split_paths(&v).collect()),
            _ => Self::default(),
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

impl Default for SearchPath {
    fn default() -> Self {
        Self::new(vec![plugins_dir()])
    }
}
