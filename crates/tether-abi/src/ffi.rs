use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};

use crate::registrar::{Params, Registrar};

/// Bump this when you break the ABI. Host checks it at load time.
pub const ABI_VERSION: u32 = 1;

/// Every plugin module exports a `PluginDeclaration` static under this name.
pub const INIT_SYMBOL: &str = "TETHER_PLUGIN_INIT";

/// First eight bytes of every declaration: `"TETHERPL"`.
pub const DECLARATION_MAGIC: u64 = u64::from_be_bytes(*b"TETHERPL");

/// Initializer signature. Called once per load with a registrar bound to the
/// module's path; returning `Err` fails the load with that error.
///
/// This is a Rust-ABI function pointer: plugins must be built with the same
/// toolchain and `tether-abi` version as the host.
pub type InitFn = fn(&dyn Registrar, &Params) -> anyhow::Result<()>;

/// Calls an [`InitFn`] on the module's side of the boundary. An error is
/// handed back through the out-slot.
pub type EntryFn = fn(InitFn, &dyn Registrar, &Params, &mut Option<anyhow::Error>) -> InitStatus;

/// What an [`EntryFn`] reports back to the host.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Ok = 0,
    /// The initializer returned `Err`; the error is in the out-slot.
    Failed = 1,
    /// The initializer panicked. Nothing else is reported.
    Faulted = 2,
}

/// Leading bytes of a declaration. The host reads and compares these before
/// it trusts anything after them.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationHeader {
    pub magic: u64,
    pub abi_version: u32,
    /// `size_of::<PluginDeclaration>()` in the module that built it.
    pub size: u32,
}

impl DeclarationHeader {
    /// Header a declaration built against this crate carries.
    pub const CURRENT: Self = Self {
        magic: DECLARATION_MAGIC,
        abi_version: ABI_VERSION,
        size: mem::size_of::<PluginDeclaration>() as u32,
    };
}

/// The value behind [`INIT_SYMBOL`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PluginDeclaration {
    pub header: DeclarationHeader,
    pub init: InitFn,
    pub entry: EntryFn,
}

impl PluginDeclaration {
    /// Declaration for `init`, entered through [`guarded_init`].
    ///
    /// Built in a const context, `entry` points at the copy of
    /// `guarded_init` linked into the crate that defines the static, so a
    /// cdylib catches its own panics with its own std.
    pub const fn new(init: InitFn) -> Self {
        Self {
            header: DeclarationHeader::CURRENT,
            init,
            entry: guarded_init,
        }
    }

    /// True when the declaration was built against this host's ABI.
    pub fn is_compatible(&self) -> bool {
        self.header == DeclarationHeader::CURRENT
    }
}

impl fmt::Debug for PluginDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDeclaration")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

/// Run `init`, catching a panic before it can unwind out of the module.
///
/// The panic hook is not touched: it belongs to whichever std this is linked
/// against and may be shared with other threads.
pub fn guarded_init(
    init: InitFn,
    reg: &dyn Registrar,
    params: &Params,
    error: &mut Option<anyhow::Error>,
) -> InitStatus {
    match panic::catch_unwind(AssertUnwindSafe(|| init(reg, params))) {
        Ok(Ok(())) => InitStatus::Ok,
        Ok(Err(e)) => {
            *error = Some(e);
            InitStatus::Failed
        }
        Err(_) => InitStatus::Faulted,
    }
}

/// Export `$init` as this module's initializer.
///
/// ```ignore
/// fn init(reg: &dyn tether_abi::Registrar, _params: &tether_abi::Params) -> anyhow::Result<()> {
///     reg.register("app.greeters", "hello", tether_abi::plugin_value("hi"), vec![]);
///     Ok(())
/// }
/// tether_abi::export_plugin!(init);
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($init:path) => {
        #[unsafe(no_mangle)]
        pub static TETHER_PLUGIN_INIT: $crate::PluginDeclaration =
            $crate::PluginDeclaration::new($init);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::PluginOption;
    use crate::registrar::PluginValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Keys(Mutex<Vec<String>>);

    impl Registrar for Keys {
        fn register(&self, _ns: &str, key: &str, _plugin: PluginValue, _opts: Vec<PluginOption>) {
            self.0.lock().unwrap().push(key.to_owned());
        }
    }

    fn noop(_reg: &dyn Registrar, _params: &Params) -> anyhow::Result<()> {
        Ok(())
    }

    fn register_then_fail(reg: &dyn Registrar, _params: &Params) -> anyhow::Result<()> {
        reg.register("ns", "first", crate::plugin_value(()), vec![]);
        anyhow::bail!("bad setting")
    }

    fn register_then_panic(reg: &dyn Registrar, _params: &Params) -> anyhow::Result<()> {
        reg.register("ns", "first", crate::plugin_value(()), vec![]);
        panic!("secret detail")
    }

    crate::export_plugin!(noop);

    #[test]
    fn exported_declaration_carries_current_header() {
        assert_eq!(TETHER_PLUGIN_INIT.header, DeclarationHeader::CURRENT);
        assert_eq!(TETHER_PLUGIN_INIT.header.abi_version, ABI_VERSION);
        assert!(TETHER_PLUGIN_INIT.is_compatible());
    }

    #[test]
    fn header_leads_with_magic() {
        assert_eq!(&DECLARATION_MAGIC.to_be_bytes(), b"TETHERPL");
        assert_eq!(mem::size_of::<DeclarationHeader>(), 16);
        assert_eq!(
            DeclarationHeader::CURRENT.size as usize,
            mem::size_of::<PluginDeclaration>()
        );
    }

    #[test]
    fn mismatched_headers_are_incompatible() {
        let stale = DeclarationHeader {
            abi_version: ABI_VERSION + 1,
            ..DeclarationHeader::CURRENT
        };
        let foreign = DeclarationHeader {
            magic: 1,
            ..DeclarationHeader::CURRENT
        };
        let resized = DeclarationHeader {
            size: DeclarationHeader::CURRENT.size + 8,
            ..DeclarationHeader::CURRENT
        };
        for header in [stale, foreign, resized] {
            let decl = PluginDeclaration {
                header,
                ..PluginDeclaration::new(noop)
            };
            assert!(!decl.is_compatible(), "{header:?}");
        }
    }

    #[test]
    fn guarded_init_reports_success() {
        let mut error = None;
        let status = (TETHER_PLUGIN_INIT.entry)(noop, &Keys::default(), &Params::new(), &mut error);
        assert_eq!(status, InitStatus::Ok);
        assert!(error.is_none());
    }

    #[test]
    fn guarded_init_hands_errors_back() {
        let keys = Keys::default();
        let mut error = None;
        let status = guarded_init(register_then_fail, &keys, &Params::new(), &mut error);
        assert_eq!(status, InitStatus::Failed);
        assert_eq!(error.unwrap().to_string(), "bad setting");
        assert_eq!(*keys.0.lock().unwrap(), vec!["first".to_string()]);
    }

    #[test]
    fn guarded_init_contains_panics() {
        let keys = Keys::default();
        let mut error = None;
        let status = guarded_init(register_then_panic, &keys, &Params::new(), &mut error);
        assert_eq!(status, InitStatus::Faulted);
        assert!(error.is_none());
        assert_eq!(*keys.0.lock().unwrap(), vec!["first".to_string()]);
    }

    #[test]
    fn debug_hides_function_pointers() {
        let s = format!("{:?}", PluginDeclaration::new(noop));
        assert!(s.contains("abi_version"));
        assert!(!s.contains("init"));
        assert!(!s.contains("entry"));
    }
}
