//! Tether ABI crate: the contract shared by the host registry and plugin modules.
//!
//! A plugin crate depends on this crate only. It exports its initializer with
//! [`export_plugin!`] and registers its extension points through the
//! [`Registrar`] it is handed at load time.

pub mod ffi;
pub mod options;
pub mod registrar;

pub use ffi::*;
pub use options::*;
pub use registrar::*;
