//! The registry: namespace name -> [`Namespace`], plus module loading.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tether_abi::{
    DeclarationHeader, INIT_SYMBOL, InitStatus, Params, PluginDeclaration, PluginOption,
    PluginValue, Registrar,
};
use tracing::{debug, info, warn};

use crate::discovery::discover;
use crate::errors::{DiscoveryError, LoadError};
use crate::handle::LoadHandle;
use crate::loader::{Module, ModuleLoader, NativeLoader};
use crate::meta::PluginMeta;
use crate::namespace::Namespace;
use crate::paths::SearchPath;

/// Outcome of loading one path in a batch.
pub type LoadOutcome = (PathBuf, Result<(), LoadError>);

struct LoadedModule {
    path: PathBuf,
    _module: Box<dyn Module>,
}

/// Thread-safe plugin registry.
///
/// Namespaces are created on first use and never replaced. The registry lock
/// only guards the name -> namespace map; it is released before a
/// namespace's own lock is taken.
pub struct Registry {
    namespaces: Mutex<HashMap<String, Arc<Namespace>>>,
    loader: Arc<dyn ModuleLoader>,
    // Declared last so it drops after the plugin values registered from it.
    modules: Mutex<Vec<LoadedModule>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
    /// Empty registry that loads native shared libraries.
    pub fn new() -> Self {
        Self::with_loader(Arc::new(NativeLoader))
    }

    /// Empty registry that opens modules through `loader`.
    pub fn with_loader(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            namespaces: Mutex::new(HashMap::new()),
            loader,
            modules: Mutex::new(Vec::new()),
        }
    }

    /// Look up `namespace`, creating it when `create` is set. Repeated calls
    /// for the same name return the same namespace.
    pub fn get(&self, namespace: &str, create: bool) -> Option<Arc<Namespace>> {
        if create {
            return Some(self.namespace(namespace));
        }
        lock(&self.namespaces).get(namespace).cloned()
    }

    fn namespace(&self, namespace: &str) -> Arc<Namespace> {
        let mut map = lock(&self.namespaces);
        let ns = map.entry(namespace.to_owned()).or_insert_with(|| {
            debug!(namespace, "creating namespace");
            Arc::new(Namespace::new(namespace))
        });
        Arc::clone(ns)
    }

    /// First plugin registered under `namespace`/`key`.
    pub fn get_plugin(&self, namespace: &str, key: &str) -> Option<Arc<PluginMeta>> {
        self.get(namespace, false)?.get(key)
    }

    /// Every plugin registered under `namespace`/`key`, oldest first.
    pub fn get_all_plugins(&self, namespace: &str, key: &str) -> Option<Vec<Arc<PluginMeta>>> {
        self.get(namespace, false)?.get_all(key)
    }

    /// Register a plugin compiled into the host. The record has an empty
    /// path and filename.
    pub fn register(
        &self,
        namespace: &str,
        key: &str,
        plugin: PluginValue,
        opts: impl IntoIterator<Item = PluginOption>,
    ) {
        self.register_from(Path::new(""), "", namespace, key, plugin, opts);
    }

    pub(crate) fn register_from(
        &self,
        path: &Path,
        filename: &str,
        namespace: &str,
        key: &str,
        plugin: PluginValue,
        opts: impl IntoIterator<Item = PluginOption>,
    ) {
        let ns = self.namespace(namespace);
        let meta = PluginMeta::new(path, filename, namespace, key, plugin, opts);
        debug!(
            namespace,
            key,
            source = if filename.is_empty() { "built-in" } else { filename },
            "registering plugin"
        );
        ns.add(key, meta);
    }

    /// Load the module at `path` and run its initializer with `params`.
    ///
    /// Registrations the initializer made before failing are kept.
    pub fn load(&self, path: impl AsRef<Path>, params: &Params) -> Result<(), LoadError> {
        let path = self
            .loader
            .resolve(path.as_ref())
            .map_err(LoadError::Resolve)?;
        let filename = self.loader.basename(&path);
        debug!(path = %path.display(), "resolved plugin path");

        let module = self.loader.open(&path).map_err(LoadError::Open)?;
        debug!(path = %path.display(), "opened plugin module");

        let symbol = module.lookup(INIT_SYMBOL).map_err(LoadError::Lookup)?;
        let decl = match symbol.downcast_ref::<PluginDeclaration>() {
            Some(decl) if decl.is_compatible() => *decl,
            found => {
                let header = found
                    .map(|d| d.header)
                    .or_else(|| symbol.downcast_ref::<DeclarationHeader>().copied());
                match header {
                    Some(h) => warn!(
                        path = %path.display(),
                        magic = h.magic,
                        abi_version = h.abi_version,
                        size = h.size,
                        "plugin declaration does not match this host"
                    ),
                    None => warn!(path = %path.display(), "entry symbol is not a plugin declaration"),
                }
                return Err(LoadError::Incompatible);
            }
        };

        let handle = LoadHandle::new(self, path.clone(), filename);
        let mut failure = None;
        // `entry` catches the initializer's panics inside the module. This
        // outer catch only sees entries that share the host's std. The panic
        // hook still prints the payload; it is process-wide, so it is left
        // installed.
        let status = panic::catch_unwind(AssertUnwindSafe(|| {
            (decl.entry)(decl.init, &handle, params, &mut failure)
        }))
        .unwrap_or(InitStatus::Faulted);

        // Anything registered above may point into the module.
        lock(&self.modules).push(LoadedModule {
            path: path.clone(),
            _module: module,
        });

        match (status, failure) {
            (InitStatus::Ok, _) => {
                info!(path = %path.display(), "plugin initialized");
                Ok(())
            }
            (InitStatus::Failed, Some(e)) => Err(LoadError::Init(e)),
            (status, _) => {
                warn!(path = %path.display(), ?status, "plugin initializer faulted");
                Err(LoadError::Faulted)
            }
        }
    }

    /// Load each path in order. A failure does not stop the batch.
    pub fn load_all<P: AsRef<Path>>(
        &self,
        paths: impl IntoIterator<Item = P>,
        params: &Params,
    ) -> Vec<LoadOutcome> {
        paths
            .into_iter()
            .map(|p| {
                let p = p.as_ref().to_path_buf();
                let res = self.load(&p, params);
                if let Err(e) = &res {
                    warn!(path = %p.display(), error = %e, "failed to load plugin");
                }
                (p, res)
            })
            .collect()
    }

    /// Discover plugin files on `search` and load them all.
    pub fn load_search_path(
        &self,
        search: &SearchPath,
        params: &Params,
    ) -> Result<Vec<LoadOutcome>, DiscoveryError> {
        let files = discover(search)?;
        Ok(self.load_all(files, params))
    }

    /// Namespace names, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.namespaces).keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolved paths of modules whose initializer has run, in load order.
    pub fn loaded_modules(&self) -> Vec<PathBuf> {
        lock(&self.modules).iter().map(|m| m.path.clone()).collect()
    }
}

impl Registrar for Registry {
    fn register(&self, namespace: &str, key: &str, plugin: PluginValue, opts: Vec<PluginOption>) {
        Registry::register(self, namespace, key, plugin, opts);
    }
}
