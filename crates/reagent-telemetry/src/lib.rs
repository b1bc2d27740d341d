//! Tracing setup shared by reagent binaries.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by the RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "reagent_stream" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// JSON lines instead of compact text.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

/// Handle to the installed subscriber.
pub struct TelemetryGuard {
    log_level: Level,
    module_levels: Arc<RwLock<Vec<(String, Level)>>>,
    filter: Option<reload::Handle<EnvFilter, Registry>>,
}

impl TelemetryGuard {
    /// Change the log level for a specific module at runtime. Rebuilds the
    /// filter from the configured levels, replacing any RUST_LOG directives.
    pub fn set_module_level(&self, module: &str, level: Level) {
        let filter_str = {
            let mut levels = self.module_levels.write();
            if let Some(entry) = levels.iter_mut().find(|(m, _)| m == module) {
                entry.1 = level;
            } else {
                levels.push((module.to_string(), level));
            }
            directives(self.log_level, &levels)
        };

        let Some(handle) = &self.filter else {
            return;
        };
        match EnvFilter::try_new(&filter_str) {
            Ok(filter) => {
                if let Err(e) = handle.reload(filter) {
                    tracing::warn!(error = %e, "failed to reload log filter");
                }
            }
            Err(e) => tracing::warn!(directives = %filter_str, error = %e, "invalid log directives"),
        }
    }

    /// Get current per-module log level overrides.
    pub fn module_levels(&self) -> Vec<(String, Level)> {
        self.module_levels.read().clone()
    }

    /// Whether this guard owns the process-wide subscriber.
    pub fn is_installed(&self) -> bool {
        self.filter.is_some()
    }
}

/// Initialize the telemetry subsystem. Call once at startup; later calls
/// leave the first subscriber in place and return an inert guard.
///
/// Logs go to stderr so stdout stays free for command output.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryGuard {
    let filter_str = directives(config.log_level, &config.module_levels);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&filter_str))
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));
    let (filter_layer, handle) = reload::Layer::new(env_filter);

    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("tracing subscriber already installed");
    }

    TelemetryGuard {
        log_level: config.log_level,
        module_levels: Arc::new(RwLock::new(config.module_levels)),
        filter: installed.then_some(handle),
    }
}

/// `EnvFilter` directives for a default level plus module overrides.
pub fn directives(level: Level, module_levels: &[(String, Level)]) -> String {
    let mut filter = level.to_string().to_lowercase();
    for (module, level) in module_levels {
        filter.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
    }
    filter
}

/// Parse a level name as written in settings or on the command line.
pub fn parse_level(raw: &str) -> Option<Level> {
    raw.trim().parse().ok()
}
