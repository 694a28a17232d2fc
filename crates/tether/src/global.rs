//! Process-wide registry and free-function shortcuts.
//!
//! Code that can take a `&Registry` should; these helpers exist for
//! top-level convenience. Tests that need isolation swap in a fresh
//! registry with [`set_registry`] and restore the old one afterwards.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tether_abi::{Params, PluginOption, PluginValue};

use crate::errors::{DiscoveryError, LoadError};
use crate::meta::PluginMeta;
use crate::namespace::Namespace;
use crate::paths::SearchPath;
use crate::registry::{LoadOutcome, Registry};

static REGISTRY: Lazy<RwLock<Arc<Registry>>> =
    Lazy::new(|| RwLock::new(Arc::new(Registry::new())));

/// The current process-wide registry.
pub fn registry() -> Arc<Registry> {
    Arc::clone(&REGISTRY.read().unwrap_or_else(PoisonError::into_inner))
}

/// Replace the process-wide registry, returning the previous one.
///
/// Calls already holding the old registry keep using it.
pub fn set_registry(reg: Arc<Registry>) -> Arc<Registry> {
    let mut slot = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, reg)
}

pub fn get(namespace: &str, create: bool) -> Option<Arc<Namespace>> {
    registry().get(namespace, create)
}

pub fn get_plugin(namespace: &str, key: &str) -> Option<Arc<PluginMeta>> {
    registry().get_plugin(namespace, key)
}

pub fn get_all_plugins(namespace: &str, key: &str) -> Option<Vec<Arc<PluginMeta>>> {
    registry().get_all_plugins(namespace, key)
}

pub fn register(
    namespace: &str,
    key: &str,
    plugin: PluginValue,
    opts: impl IntoIterator<Item = PluginOption>,
) {
    registry().register(namespace, key, plugin, opts);
}

pub fn load(path: impl AsRef<Path>, params: &Params) -> Result<(), LoadError> {
    registry().load(path, params)
}

/// Load everything on `$TETHER_PLUGIN_PATH` (or the default plugins dir).
pub fn load_configured(params: &Params) -> Result<Vec<LoadOutcome>, DiscoveryError> {
    registry().load_search_path(&SearchPath::from_env(), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::ENV_PLUGIN_PATH;
    use crate::testing::{FakeLoader, FakeModule};
    use std::env;
    use tether_abi::{Registrar, plugin_value};

    fn init(reg: &dyn Registrar, _params: &Params) -> anyhow::Result<()> {
        reg.register("configured", "k", plugin_value(()), vec![]);
        Ok(())
    }

    #[test]
    fn load_configured_reads_the_env_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir
            .path()
            .join(format!("libconfigured.{}", env::consts::DLL_EXTENSION));
        let broken = dir
            .path()
            .join(format!("libzbroken.{}", env::consts::DLL_EXTENSION));
        std::fs::write(&lib, b"").unwrap();
        std::fs::write(&broken, b"").unwrap();

        let fresh = Arc::new(Registry::with_loader(Arc::new(
            FakeLoader::new().with_module(lib.clone(), FakeModule::new().with_init(init)),
        )));
        let previous = set_registry(Arc::clone(&fresh));
        let value = env::join_paths([dir.path().join("missing"), dir.path().to_path_buf()]).unwrap();
        // SAFETY: no other test in this crate reads or writes this variable.
        unsafe { env::set_var(ENV_PLUGIN_PATH, value) };

        let out = load_configured(&Params::new());

        // SAFETY: as above.
        unsafe { env::remove_var(ENV_PLUGIN_PATH) };
        set_registry(previous);

        let out = out.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, lib);
        assert!(out[0].1.is_ok());
        assert_eq!(out[1].0, broken);
        assert!(matches!(out[1].1, Err(LoadError::Open(_))));
        assert_eq!(fresh.loaded_modules(), vec![lib]);
        assert!(fresh.get_plugin("configured", "k").is_some());
    }
}
