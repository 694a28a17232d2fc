//! Serializable view of the registry, for diagnostics and host UIs.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::meta::PluginMeta;
use crate::registry::Registry;

/// Everything about a record except the plugin value itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub path: PathBuf,
    pub filename: String,
    pub name: String,
    pub version: String,
    pub license: String,
    pub docs: String,
    pub api_version: i32,
    pub meta: HashMap<String, Value>,
}

impl From<&PluginMeta> for PluginInfo {
    fn from(m: &PluginMeta) -> Self {
        Self {
            path: m.path.clone(),
            filename: m.filename.clone(),
            name: m.name.clone(),
            version: m.version.clone(),
            license: m.license.clone(),
            docs: m.docs.clone(),
            api_version: m.api_version,
            meta: m.meta.clone(),
        }
    }
}

/// namespace -> key -> records, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub namespaces: BTreeMap<String, BTreeMap<String, Vec<PluginInfo>>>,
    pub modules: Vec<PathBuf>,
}

impl Registry {
    /// Point-in-time copy of every namespace. Each key is copied atomically;
    /// the snapshot as a whole is not.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut namespaces = BTreeMap::new();
        for name in self.namespaces() {
            let Some(ns) = self.get(&name, false) else {
                continue;
            };
            let keys = ns
                .keys()
                .into_iter()
                .filter_map(|k| {
                    let infos = ns.get_all(&k)?.iter().map(|m| PluginInfo::from(&**m)).collect();
                    Some((k, infos))
                })
                .collect();
            namespaces.insert(name, keys);
        }
        RegistrySnapshot {
            namespaces,
            modules: self.loaded_modules(),
        }
    }
}
