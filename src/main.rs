use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use reagent_extract::{Extractor, ExtractorConfig};
use reagent_settings::{ReagentSettings, SettingsError};
use reagent_telemetry::{init_telemetry, parse_level, TelemetryConfig};

/// Render call site tooling for reagent agent nodes.
#[derive(Parser, Debug)]
#[command(name = "reagent", version)]
struct Cli {
    /// Settings file to use instead of ~/.reagent/settings.json.
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Log level, overriding settings and REAGENT_LOG_LEVEL.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the render call site manifest of every node in a source file.
    Extract {
        file: PathBuf,
        /// Execution method name.
        #[arg(long)]
        method: Option<String>,
        /// Render operation name.
        #[arg(long)]
        render: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective settings.
    Settings,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(reagent_settings::settings_path);
    let (settings, load_error) = match reagent_settings::load_settings_from_path(&settings_path) {
        Ok(settings) => (settings, None),
        Err(e) => (ReagentSettings::default(), Some(e)),
    };

    let _telemetry = init_telemetry(telemetry_config(&settings, cli.log_level.as_deref()));
    if let Some(e) = load_error {
        report_settings_error(&settings_path, &e);
    }

    match cli.command {
        Command::Extract {
            file,
            method,
            render,
            pretty,
        } => {
            let config = ExtractorConfig {
                method: method.unwrap_or(settings.extract.method),
                render: render.unwrap_or(settings.extract.render),
            };
            let output = extract(&file, config, pretty)?;
            println!("{output}");
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}

fn extract(file: &Path, config: ExtractorConfig, pretty: bool) -> anyhow::Result<String> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    tracing::debug!(file = %file.display(), method = %config.method, render = %config.render, "extracting");
    let manifests = Extractor::new(config)
        .extract_source(&source)
        .map_err(|e| anyhow::anyhow!("{}: {e}", file.display()))?;
    tracing::info!(
        file = %file.display(),
        nodes = manifests.len(),
        sites = manifests.iter().map(|m| m.sites.len()).sum::<usize>(),
        "extracted render call sites"
    );

    let output = if pretty {
        serde_json::to_string_pretty(&manifests)?
    } else {
        serde_json::to_string(&manifests)?
    };
    Ok(output)
}

fn telemetry_config(settings: &ReagentSettings, log_level: Option<&str>) -> TelemetryConfig {
    let logging = &settings.logging;
    let defaults = TelemetryConfig::default();
    TelemetryConfig {
        log_level: log_level
            .or(Some(logging.level.as_str()))
            .and_then(parse_level)
            .unwrap_or(defaults.log_level),
        module_levels: logging
            .module_levels
            .iter()
            .filter_map(|(module, level)| Some((module.clone(), parse_level(level)?)))
            .collect(),
        json: logging.json,
    }
}

fn report_settings_error(path: &Path, e: &SettingsError) {
    tracing::warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn cli_parses_extract_flags() {
        let cli = Cli::try_parse_from([
            "reagent", "extract", "node.rs", "--method", "run", "--pretty", "--log-level", "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Extract {
                file,
                method,
                render,
                pretty,
            } => {
                assert_eq!(file, PathBuf::from("node.rs"));
                assert_eq!(method.as_deref(), Some("run"));
                assert!(render.is_none());
                assert!(pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn telemetry_config_prefers_flag_then_settings() {
        let mut settings = ReagentSettings::default();
        settings.logging.level = "warn".into();
        settings
            .logging
            .module_levels
            .insert("reagent_extract".into(), "trace".into());
        settings
            .logging
            .module_levels
            .insert("noisy".into(), "shouting".into());

        let config = telemetry_config(&settings, None);
        assert_eq!(config.log_level, Level::WARN);
        assert_eq!(config.module_levels, vec![("reagent_extract".to_string(), Level::TRACE)]);

        assert_eq!(telemetry_config(&settings, Some("error")).log_level, Level::ERROR);
        assert_eq!(telemetry_config(&settings, Some("bogus")).log_level, Level::INFO);
    }
}
