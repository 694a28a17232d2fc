//! tether
//!
//! Runtime plugin registry. Applications group extension points into
//! namespaces of keyed plugin lists; shared-library modules register
//! themselves into the same registry when loaded.
//!
//! - `Registry` / `Namespace` hold the data and serialize mutation.
//! - `Registry::load` runs the dynamic-load handshake (resolve, open,
//!   look up `TETHER_PLUGIN_INIT`, check the declaration header, call the
//!   initializer through its panic-catching entry).
//! - `global` keeps a process-wide registry behind free functions.

pub mod discovery;
pub mod errors;
pub mod global;
pub mod handle;
pub mod iter;
pub mod loader;
pub mod meta;
pub mod namespace;
pub mod paths;
pub mod registry;
pub mod snapshot;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use discovery::{discover, is_plugin_file};
pub use errors::{BoxError, DiscoveryError, LoadError};
pub use global::{
    get, get_all_plugins, get_plugin, load, load_configured, register, registry, set_registry,
};
pub use handle::LoadHandle;
pub use iter::{PluginIter, iter_plugins};
pub use loader::{Module, ModuleLoader, NativeLoader};
pub use meta::PluginMeta;
pub use namespace::Namespace;
pub use paths::*;
pub use registry::{LoadOutcome, Registry};
pub use snapshot::{PluginInfo, RegistrySnapshot};

// Re-exported so hosts need only one dependency.
pub use tether_abi::{
    self as abi, ABI_VERSION, DECLARATION_MAGIC, DeclarationHeader, EntryFn, INIT_SYMBOL, InitFn,
    InitStatus, Params, PluginDeclaration, PluginOption, PluginValue, Registrar, api_version, docs,
    license, meta, name, plugin_value, version,
};
