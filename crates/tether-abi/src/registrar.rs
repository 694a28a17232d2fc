use std::any::Any;
use std::sync::Arc;

use crate::options::PluginOption;

/// The plugin itself. Its shape is defined by whoever owns the namespace;
/// the registry never looks inside.
pub type PluginValue = Arc<dyn Any + Send + Sync>;

/// Caller-supplied parameters handed to a plugin initializer unmodified.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Wrap a value for registration.
pub fn plugin_value<T: Any + Send + Sync>(v: T) -> PluginValue {
    Arc::new(v)
}

/// Registration surface handed to plugin initializers.
///
/// Records registered through the handle a module receives at load time are
/// stamped with that module's path and filename.
pub trait Registrar {
    fn register(&self, namespace: &str, key: &str, plugin: PluginValue, opts: Vec<PluginOption>);
}
