use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root settings.
///
/// Read from `~/.reagent/settings.json`; every field is optional there and
/// falls back to its default. Example:
///
/// ```json
/// {
///   "extract": { "method": "run" },
///   "logging": { "level": "debug", "moduleLevels": { "reagent_stream": "trace" } }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReagentSettings {
    pub extract: ExtractSettings,
    pub logging: LoggingSettings,
}

/// Names the render call extractor looks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractSettings {
    /// Execution method name.
    pub method: String,
    /// Render operation name on the execution context.
    pub render: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            method: "execute".into(),
            render: "render".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    /// JSON lines instead of compact text.
    pub json: bool,
    /// Per-module level overrides, e.g. `"reagent_stream": "debug"`.
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            module_levels: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_serialize_in_camel_case() {
        let value = serde_json::to_value(ReagentSettings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "extract": { "method": "execute", "render": "render" },
                "logging": { "level": "info", "json": false, "moduleLevels": {} }
            })
        );
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: ReagentSettings =
            serde_json::from_value(json!({ "logging": { "json": true } })).unwrap();
        assert!(settings.logging.json);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.extract, ExtractSettings::default());
    }
}
