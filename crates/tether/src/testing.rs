//! Test doubles for code built on the registry.
//!
//! `FakeLoader`/`FakeModule` script the module-loading seam so the load
//! protocol can be exercised without shared objects. `RecordingRegistrar`
//! lets plugin crates unit-test their initializers. [`built_cdylib`] finds
//! a plugin crate's own shared library from its integration tests.

use std::any::Any;
use std::collections::HashMap;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::{env, fs, io};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tether_abi::{INIT_SYMBOL, InitFn, PluginDeclaration, PluginOption, PluginValue, Registrar};

use crate::errors::BoxError;
use crate::loader::{Module, ModuleLoader};

type SymbolFn = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

/// In-memory module: a table of named symbols.
#[derive(Clone, Default)]
pub struct FakeModule {
    symbols: HashMap<String, SymbolFn>,
}

impl FakeModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `value` under `name`. Lookups return a fresh clone.
    pub fn with_symbol<T: Any + Clone + Send + Sync>(mut self, name: &str, value: T) -> Self {
        self.symbols.insert(
            name.to_owned(),
            Arc::new(move || Box::new(value.clone()) as Box<dyn Any>),
        );
        self
    }

    /// Export a current-ABI declaration for `init` under the entry symbol.
    pub fn with_init(self, init: InitFn) -> Self {
        self.with_symbol(INIT_SYMBOL, PluginDeclaration::new(init))
    }
}

impl Module for FakeModule {
    fn lookup(&self, symbol: &str) -> Result<Box<dyn Any>, BoxError> {
        match self.symbols.get(symbol) {
            Some(make) => Ok(make()),
            None => Err(format!("symbol {symbol} not found").into()),
        }
    }
}

/// Scripted [`ModuleLoader`].
///
/// Relative paths resolve under `/plugins`. Paths with no registered
/// module fail to open.
#[derive(Default)]
pub struct FakeLoader {
    resolve_error: Option<String>,
    open_error: Option<String>,
    modules: HashMap<PathBuf, FakeModule>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `resolve` with `msg`.
    pub fn fail_resolve(mut self, msg: &str) -> Self {
        self.resolve_error = Some(msg.to_owned());
        self
    }

    /// Fail every `open` with `msg`.
    pub fn fail_open(mut self, msg: &str) -> Self {
        self.open_error = Some(msg.to_owned());
        self
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>, module: FakeModule) -> Self {
        self.modules.insert(path.into(), module);
        self
    }
}

impl ModuleLoader for FakeLoader {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        if let Some(msg) = &self.resolve_error {
            return Err(io::Error::other(msg.clone()));
        }
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(Path::new("/plugins").join(path))
        }
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Module>, BoxError> {
        if let Some(msg) = &self.open_error {
            return Err(msg.clone().into());
        }
        match self.modules.get(path) {
            Some(m) => Ok(Box::new(m.clone())),
            None => Err(format!("{}: cannot open shared object file", path.display()).into()),
        }
    }
}

/// One call captured by [`RecordingRegistrar`].
#[derive(Clone)]
pub struct Registration {
    pub namespace: String,
    pub key: String,
    pub plugin: PluginValue,
    pub opts: Vec<PluginOption>,
}

/// Registrar that just remembers what it was asked to register.
#[derive(Default)]
pub struct RecordingRegistrar {
    calls: Mutex<Vec<Registration>>,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registrations for one namespace/key, in call order.
    pub fn find(&self, namespace: &str, key: &str) -> Vec<Registration> {
        self.registrations()
            .into_iter()
            .filter(|r| r.namespace == namespace && r.key == key)
            .collect()
    }
}

impl Registrar for RecordingRegistrar {
    fn register(&self, namespace: &str, key: &str, plugin: PluginValue, opts: Vec<PluginOption>) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Registration {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
                plugin,
                opts,
            });
    }
}

/// Path of the shared library cargo built for crate `lib_name` (its
/// `[lib] name`), next to the running test binary.
///
/// Cargo builds a package's cdylib before that package's integration tests,
/// so this is only reliable from the plugin crate's own `tests/`.
pub fn built_cdylib(lib_name: &str) -> Option<PathBuf> {
    let file = format!("{DLL_PREFIX}{lib_name}{DLL_SUFFIX}");
    let exe = env::current_exe().ok()?;
    let deps = exe.parent()?;

    let exact = [Some(deps), deps.parent()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(&file))
        .find(|p| p.is_file());
    if exact.is_some() {
        return exact;
    }

    // Hashed name in deps/, e.g. libtether_hello-1a2b3c.so.
    let stem = format!("{DLL_PREFIX}{lib_name}-");
    fs::read_dir(deps)
        .ok()?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| n.starts_with(&stem) && n.ends_with(DLL_SUFFIX))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_abi::{Params, name, plugin_value};

    fn init(reg: &dyn Registrar, _params: &Params) -> anyhow::Result<()> {
        reg.register("ns", "a", plugin_value(1), vec![name("first")]);
        reg.register("ns", "b", plugin_value(2), vec![]);
        reg.register("ns", "a", plugin_value(3), vec![]);
        Ok(())
    }

    #[test]
    fn recording_registrar_captures_calls_in_order() {
        let rec = RecordingRegistrar::new();
        init(&rec, &Params::new()).unwrap();

        assert_eq!(rec.registrations().len(), 3);
        let a = rec.find("ns", "a");
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].opts, vec![name("first")]);
        assert_eq!(a[1].plugin.downcast_ref::<i32>(), Some(&3));
    }

    #[test]
    fn fake_module_returns_fresh_symbols() {
        let m = FakeModule::new().with_symbol("answer", 42u64);
        assert_eq!(m.lookup("answer").unwrap().downcast_ref::<u64>(), Some(&42));
        assert_eq!(m.lookup("answer").unwrap().downcast_ref::<u64>(), Some(&42));
        assert!(m.lookup("question").is_err());
    }

    #[test]
    fn fake_loader_resolves_relative_paths_under_plugins() {
        let l = FakeLoader::new();
        assert_eq!(l.resolve(Path::new("x.so")).unwrap(), Path::new("/plugins/x.so"));
        assert_eq!(l.resolve(Path::new("/abs/x.so")).unwrap(), Path::new("/abs/x.so"));
        assert!(l.open(Path::new("/abs/x.so")).is_err());
    }

    #[test]
    fn built_cdylib_is_absent_for_unknown_crates() {
        assert!(built_cdylib("no_such_tether_plugin").is_none());
    }
}
