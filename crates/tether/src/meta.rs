//! Descriptor of one registered plugin and where it came from.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use tether_abi::{PluginOption, PluginValue};

/// Metadata for a registered plugin.
///
/// Built once by [`PluginMeta::new`] and shared as `Arc<PluginMeta>` from
/// then on; the registry never mutates a record after construction.
#[derive(Clone)]
pub struct PluginMeta {
    /// Resolved path of the module that registered this plugin. Empty for
    /// plugins compiled into the host.
    pub path: PathBuf,
    /// Basename of `path`.
    pub filename: String,
    pub namespace: String,
    pub key: String,
    pub plugin: PluginValue,
    pub name: String,
    pub version: String,
    pub license: String,
    pub docs: String,
    pub api_version: i32,
    /// Arbitrary extra metadata. Always present, possibly empty.
    pub meta: HashMap<String, Value>,
}

impl PluginMeta {
    /// Build a record and apply `opts` in order (later options win).
    pub fn new(
        path: impl Into<PathBuf>,
        filename: impl Into<String>,
        namespace: impl Into<String>,
        key: impl Into<String>,
        plugin: PluginValue,
        opts: impl IntoIterator<Item = PluginOption>,
    ) -> Self {
        let mut meta = Self {
            path: path.into(),
            filename: filename.into(),
            namespace: namespace.into(),
            key: key.into(),
            plugin,
            name: String::new(),
            version: String::new(),
            license: String::new(),
            docs: String::new(),
            api_version: 0,
            meta: HashMap::new(),
        };
        for opt in opts {
            meta.apply(opt);
        }
        meta
    }

    fn apply(&mut self, opt: PluginOption) {
        match opt {
            PluginOption::Name(v) => self.name = v,
            PluginOption::Version(v) => self.version = v,
            PluginOption::License(v) => self.license = v,
            PluginOption::Docs(v) => self.docs = v,
            PluginOption::ApiVersion(v) => self.api_version = v,
            PluginOption::Meta(k, v) => {
                self.meta.insert(k, v);
            }
        }
    }

    /// True for plugins registered directly by the host, not by a module.
    pub fn is_builtin(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Borrow the plugin as `T`, or `None` if it is some other type.
    pub fn plugin_as<T: Any>(&self) -> Option<&T> {
        self.plugin.downcast_ref::<T>()
    }
}

impl fmt::Debug for PluginMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginMeta")
            .field("path", &self.path)
            .field("filename", &self.filename)
            .field("namespace", &self.namespace)
            .field("key", &self.key)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("license", &self.license)
            .field("docs", &self.docs)
            .field("api_version", &self.api_version)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
