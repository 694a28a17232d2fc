//! Hello plugin: registers one greeter per language under `tether.greeters`.
//!
//! Parameters:
//! - `languages`: array of language codes to register (default: all).
//! - `punctuation`: string appended to every greeting (default: "").

use anyhow::{Context, bail};
use serde_json::Value;
use tether_abi::{Params, Registrar, api_version, docs, license, meta, name, plugin_value, version};

pub const NAMESPACE: &str = "tether.greeters";

/// Plugin shape for the greeters namespace.
pub type Greeter = fn(&str) -> String;

/// Greeter API version. Hosts check `PluginMeta::api_version` before calling.
pub const GREETER_API: i32 = 1;

fn english(who: &str) -> String {
    format!("Hello, {who}")
}

fn french(who: &str) -> String {
    format!("Bonjour, {who}")
}

fn german(who: &str) -> String {
    format!("Hallo, {who}")
}

const GREETERS: &[(&str, &str, Greeter)] = &[
    ("en", "English", english),
    ("fr", "French", french),
    ("de", "German", german),
];

fn requested_languages(params: &Params) -> anyhow::Result<Vec<String>> {
    let Some(v) = params.get("languages") else {
        return Ok(GREETERS.iter().map(|(code, _, _)| code.to_string()).collect());
    };
    let arr = v.as_array().context("`languages` must be an array")?;
    arr.iter()
        .map(|l| {
            l.as_str()
                .map(str::to_owned)
                .context("`languages` entries must be strings")
        })
        .collect()
}

fn init(reg: &dyn Registrar, params: &Params) -> anyhow::Result<()> {
    let languages = requested_languages(params)?;
    let punctuation = match params.get("punctuation") {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => bail!("`punctuation` must be a string, got {other}"),
    };

    for code in &languages {
        let Some((code, display, greet)) = GREETERS.iter().find(|(c, _, _)| c == code) else {
            bail!("unsupported language `{code}`");
        };
        reg.register(
            NAMESPACE,
            code,
            plugin_value(*greet),
            vec![
                name(format!("{display} greeter")),
                version(env!("CARGO_PKG_VERSION")),
                license("MIT OR Apache-2.0"),
                docs(format!("Greets someone in {display}.")),
                api_version(GREETER_API),
                meta("punctuation", punctuation.clone()),
            ],
        );
    }
    Ok(())
}

tether_abi::export_plugin!(init);
