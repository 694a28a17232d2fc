//! A single namespace: key -> plugins in registration order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::meta::PluginMeta;

/// Thread-safe plugin table for one namespace.
///
/// Each operation takes the namespace's own lock for its whole duration, so
/// `get_all` never observes a half-applied `add`.
#[derive(Debug)]
pub struct Namespace {
    name: String,
    contents: Mutex<HashMap<String, Vec<Arc<PluginMeta>>>>,
}

impl Namespace {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: Mutex::new(HashMap::new()),
        }
    }

    // Critical sections are a single lookup or push; a panic elsewhere
    // cannot leave the map half-updated.
    fn contents(&self) -> MutexGuard<'_, HashMap<String, Vec<Arc<PluginMeta>>>> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First plugin registered under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<PluginMeta>> {
        self.contents().get(key).and_then(|v| v.first()).cloned()
    }

    /// Point-in-time copy of every plugin registered under `key`, oldest first.
    /// Records are shared with the registry; the list is not.
    pub fn get_all(&self, key: &str) -> Option<Vec<Arc<PluginMeta>>> {
        self.contents().get(key).cloned()
    }

    /// Append `meta` under `key`. No deduplication, and `meta.key` is not
    /// checked against `key`.
    pub fn add(&self, key: &str, meta: impl Into<Arc<PluginMeta>>) {
        self.contents()
            .entry(key.to_owned())
            .or_default()
            .push(meta.into());
    }

    /// Keys with at least one plugin, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.contents().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of records across all keys.
    pub fn len(&self) -> usize {
        self.contents().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
