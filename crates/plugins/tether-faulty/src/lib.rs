//! Faulting plugin: registers `before-panic` under `tether.faulty`, then
//! panics. Used to check that a separately built module cannot take the
//! host down.

use tether_abi::{plugin_value, Params, Registrar};

pub const NAMESPACE: &str = "tether.faulty";
pub const KEY: &str = "before-panic";

fn init(reg: &dyn Registrar, _params: &Params) -> anyhow::Result<()> {
    reg.register(NAMESPACE, KEY, plugin_value(7u32), vec![]);
    panic!("secret detail from tether-faulty")
}

tether_abi::export_plugin!(init);
