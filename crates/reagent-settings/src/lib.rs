//! Layered reagent settings: compiled defaults, then the user file
//! `~/.reagent/settings.json`, then `REAGENT_*` environment variables.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_settings, load_settings_from_path,
    read_settings_file, settings_path,
};
pub use types::{ExtractSettings, LoggingSettings, ReagentSettings};
