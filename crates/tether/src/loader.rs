//! Host module-loading capability.
//!
//! The registry only needs three things from the platform: make a path
//! absolute, open a module, and look a symbol up in it. [`ModuleLoader`] and
//! [`Module`] are that seam; [`NativeLoader`] backs it with `libloading`.
//!
//! Safety note for native modules:
//! - The initializer is a Rust-ABI function pointer, so plugins must be built
//!   with the same toolchain and `tether-abi` version as the host.
//! - A cdylib links its own std, so a panic must not unwind into the host.
//!   The declaration's `entry` (`tether_abi::guarded_init`) catches it inside
//!   the module and reports `InitStatus::Faulted`.
//! - Native libraries are never unloaded. Plugin values registered by a
//!   module can outlive the registry that loaded it (callers hold `Arc`s),
//!   and their code lives in the library.

use std::any::Any;
use std::ffi::c_void;
use std::io;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tether_abi::{DeclarationHeader, INIT_SYMBOL, PluginDeclaration};

use crate::errors::BoxError;

/// An opened module.
pub trait Module: Send {
    /// Look up `symbol`. The returned value is whatever the module exports
    /// under that name; callers downcast it to the shape they expect.
    fn lookup(&self, symbol: &str) -> Result<Box<dyn Any>, BoxError>;
}

pub trait ModuleLoader: Send + Sync {
    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }

    fn basename(&self, path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Module>, BoxError>;
}

/// Loads shared objects with the platform's dynamic linker.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLoader;

impl ModuleLoader for NativeLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn Module>, BoxError> {
        // SAFETY: running a library's initializers is inherent to loading
        // plugins; the caller chose to trust `path`.
        let lib = unsafe { Library::new(path) }?;
        Ok(Box::new(NativeModule {
            lib: ManuallyDrop::new(lib),
        }))
    }
}

struct NativeModule {
    lib: ManuallyDrop<Library>,
}

impl Module for NativeModule {
    fn lookup(&self, symbol: &str) -> Result<Box<dyn Any>, BoxError> {
        // SAFETY: we only take the symbol's address here; it is read below
        // according to what is exported under that name.
        let sym: Symbol<*const c_void> = unsafe { self.lib.get(symbol.as_bytes()) }?;
        let addr = *sym;
        if addr.is_null() {
            return Err(format!("symbol {symbol} resolved to null").into());
        }
        if symbol != INIT_SYMBOL {
            return Ok(Box::new(addr));
        }

        // A declaration starts with a fixed header (magic, ABI version,
        // size). A header that does not match comes back on its own, and the
        // registry rejects it. A symbol shorter than the header is read past
        // its end; the entry symbol name is reserved for declarations.
        // SAFETY: `addr` is non-null and points at an exported static.
        let header = unsafe { std::ptr::read_unaligned(addr as *const DeclarationHeader) };
        if header != DeclarationHeader::CURRENT {
            return Ok(Box::new(header));
        }
        // SAFETY: magic, version and size match, so the static was emitted
        // by `export_plugin!` against this ABI.
        let decl = unsafe { *(addr as *const PluginDeclaration) };
        Ok(Box::new(decl))
    }
}
