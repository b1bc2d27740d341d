//! Settings loading.
//!
//! 1. Compiled [`ReagentSettings::default()`]
//! 2. `~/.reagent/settings.json`, deep-merged over the defaults
//! 3. `REAGENT_*` environment overrides
//!
//! Merge rules: objects merge per key, arrays and primitives are replaced,
//! and nulls in the user file leave the default in place.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::ReagentSettings;

pub const ENV_EXTRACT_METHOD: &str = "REAGENT_EXTRACT_METHOD";
pub const ENV_RENDER_METHOD: &str = "REAGENT_RENDER_METHOD";
pub const ENV_LOG_LEVEL: &str = "REAGENT_LOG_LEVEL";
pub const ENV_LOG_JSON: &str = "REAGENT_LOG_JSON";

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// `~/.reagent/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".reagent").join("settings.json")
}

/// Load from the default path, then apply environment overrides.
pub fn load_settings() -> Result<ReagentSettings> {
    load_settings_from_path(&settings_path())
}

/// Load from `path`, then apply environment overrides. A missing file means
/// defaults; an unreadable or malformed one is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ReagentSettings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the file at `path`, without environment overrides.
pub fn read_settings_file(path: &Path) -> Result<ReagentSettings> {
    let defaults = serde_json::to_value(ReagentSettings::default())?;
    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };
    Ok(serde_json::from_value(merged)?)
}

pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut merged), Value::Object(overrides)) => {
            for (key, value) in overrides.into_iter().filter(|(_, v)| !v.is_null()) {
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (_, source) => source,
    }
}

/// Apply `REAGENT_*` variables from the process environment.
pub fn apply_env_overrides(settings: &mut ReagentSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`. Empty and invalid values are
/// ignored, invalid ones with a warning.
pub fn apply_overrides(settings: &mut ReagentSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = read(ENV_EXTRACT_METHOD) {
        match parse_ident(&v) {
            Some(name) => settings.extract.method = name,
            None => invalid(ENV_EXTRACT_METHOD, &v),
        }
    }
    if let Some(v) = read(ENV_RENDER_METHOD) {
        match parse_ident(&v) {
            Some(name) => settings.extract.render = name,
            None => invalid(ENV_RENDER_METHOD, &v),
        }
    }
    if let Some(v) = read(ENV_LOG_LEVEL) {
        match parse_level(&v) {
            Some(level) => settings.logging.level = level,
            None => invalid(ENV_LOG_LEVEL, &v),
        }
    }
    if let Some(v) = read(ENV_LOG_JSON) {
        match parse_bool(&v) {
            Some(json) => settings.logging.json = json,
            None => invalid(ENV_LOG_JSON, &v),
        }
    }
}

fn invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "invalid env override, ignoring");
}

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A Rust identifier usable as a method name.
pub fn parse_ident(val: &str) -> Option<String> {
    let val = val.trim();
    let mut chars = val.chars();
    let first = chars.next()?;
    let valid = (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && val != "_";
    valid.then(|| val.to_owned())
}

/// A tracing level name, normalized to lower case.
pub fn parse_level(val: &str) -> Option<String> {
    let level = val.trim().to_ascii_lowercase();
    LEVELS.contains(&level.as_str()).then_some(level)
}
