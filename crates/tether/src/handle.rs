use std::path::{Path, PathBuf};

use tether_abi::{PluginOption, PluginValue, Registrar};

use crate::registry::Registry;

/// Registrar handed to a module's initializer during [`Registry::load`].
///
/// Everything registered through it is stamped with the module's resolved
/// path and filename.
pub struct LoadHandle<'a> {
    registry: &'a Registry,
    path: PathBuf,
    filename: String,
}

impl<'a> LoadHandle<'a> {
    pub(crate) fn new(registry: &'a Registry, path: PathBuf, filename: String) -> Self {
        Self {
            registry,
            path,
            filename,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl Registrar for LoadHandle<'_> {
    fn register(&self, namespace: &str, key: &str, plugin: PluginValue, opts: Vec<PluginOption>) {
        self.registry
            .register_from(&self.path, &self.filename, namespace, key, plugin, opts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_abi::{plugin_value, version};

    #[test]
    fn registrations_carry_module_provenance() {
        let reg = Registry::new();
        let handle = LoadHandle::new(&reg, PathBuf::from("/p/libgreet.so"), "libgreet.so".into());
        assert_eq!(handle.filename(), "libgreet.so");

        handle.register("greeters", "en", plugin_value("hello"), vec![version("0.2.0")]);

        let m = reg.get_plugin("greeters", "en").unwrap();
        assert_eq!(m.path, Path::new("/p/libgreet.so"));
        assert_eq!(m.filename, "libgreet.so");
        assert_eq!(m.namespace, "greeters");
        assert_eq!(m.key, "en");
        assert_eq!(m.version, "0.2.0");
        assert!(!m.is_builtin());
    }
}
