use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use pulse_server::WebServerConfig;
use pulse_telemetry::TelemetryConfig;

/// Command-line arguments. Anything not given here falls back to the
/// settings file, then `PULSE__*` environment variables, then defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "pulse", about = "Instrumented ping service")]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Webserver listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Webserver listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Force-enable telemetry export regardless of configuration
    #[arg(long)]
    pub telemetry: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub webserver: WebServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads settings layered as defaults < file < environment < CLI flags.
///
/// Environment variables use the `PULSE` prefix with `__` as the section
/// separator, e.g. `PULSE__TELEMETRY__ENABLED=true` or
/// `PULSE__TELEMETRY__SERVICE_NAME=pulse-staging`.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut builder = Config::builder()
        .set_default("log_level", "info")?
        .set_default("webserver.enabled", true)?
        .set_default("webserver.host", "127.0.0.1")?
        .set_default("webserver.port", 8080_i64)?;

    if let Some(path) = &cli.config {
        builder = builder.add_source(File::with_name(path));
    }

    builder = builder.add_source(
        Environment::with_prefix("PULSE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let mut settings: Settings = builder
        .build()
        .context("loading settings")?
        .try_deserialize()
        .context("deserializing settings")?;

    if let Some(host) = &cli.host {
        settings.webserver.host = host.clone();
    }
    if let Some(port) = cli.port {
        settings.webserver.port = port;
    }
    if cli.telemetry {
        settings.telemetry.enabled = true;
    }

    Ok(settings)
}
