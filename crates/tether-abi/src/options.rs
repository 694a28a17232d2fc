//! Optional metadata supplied at registration time.
//!
//! Each option sets exactly one field. Options are applied in the order
//! given, so a repeated option overrides the earlier one.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum PluginOption {
    /// Display name, which may differ from the key or filename.
    Name(String),
    Version(String),
    /// Text describing the plugin license.
    License(String),
    Docs(String),
    /// Version of the plugin API, for applications that evolve their
    /// calling convention.
    ApiVersion(i32),
    /// Any other metadata the application wants to attach.
    Meta(String, Value),
}

pub fn name(v: impl Into<String>) -> PluginOption {
    PluginOption::Name(v.into())
}

pub fn version(v: impl Into<String>) -> PluginOption {
    PluginOption::Version(v.into())
}

pub fn license(v: impl Into<String>) -> PluginOption {
    PluginOption::License(v.into())
}

pub fn docs(v: impl Into<String>) -> PluginOption {
    PluginOption::Docs(v.into())
}

pub fn api_version(v: i32) -> PluginOption {
    PluginOption::ApiVersion(v)
}

pub fn meta(key: impl Into<String>, value: impl Into<Value>) -> PluginOption {
    PluginOption::Meta(key.into(), value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_build_matching_variants() {
        assert_eq!(name("n"), PluginOption::Name("n".into()));
        assert_eq!(version("1.2.0"), PluginOption::Version("1.2.0".into()));
        assert_eq!(license("MIT"), PluginOption::License("MIT".into()));
        assert_eq!(docs("d"), PluginOption::Docs("d".into()));
        assert_eq!(api_version(3), PluginOption::ApiVersion(3));
    }

    #[test]
    fn meta_accepts_any_json_value() {
        assert_eq!(
            meta("tags", json!(["a", "b"])),
            PluginOption::Meta("tags".into(), json!(["a", "b"]))
        );
        assert_eq!(meta("weight", 5), PluginOption::Meta("weight".into(), json!(5)));
    }
}
