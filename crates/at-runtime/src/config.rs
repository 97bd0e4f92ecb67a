//! Command line and configuration file handling.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, then command
//! line flags (or their `AT_*` environment variables).

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use at_05_api_gateway::GatewayConfig;
use clap::Parser;
use tracing::info;

/// AdminTable - admin tables and live fields over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "at-runtime", author, version, about, long_about = None)]
pub struct Args {
    /// Gateway configuration file (TOML)
    #[arg(short, long, env = "AT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides `http.host`
    #[arg(long, env = "AT_HOST")]
    pub host: Option<IpAddr>,

    /// Port to bind, overrides `http.port`
    #[arg(short, long, env = "AT_PORT")]
    pub port: Option<u16>,

    /// Milliseconds between two demo live values
    #[arg(long, env = "AT_LIVE_INTERVAL_MS", default_value_t = 1000)]
    pub live_interval_ms: u64,
}

impl Args {
    pub fn live_interval(&self) -> Duration {
        Duration::from_millis(self.live_interval_ms.max(1))
    }
}

/// Parse a gateway configuration from TOML text.
pub fn parse_gateway_config(text: &str) -> Result<GatewayConfig> {
    toml::from_str(text).context("Invalid gateway configuration")
}

/// Read the configuration file, or fall back to defaults without one.
pub fn load_gateway_config(path: Option<&Path>) -> Result<GatewayConfig> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(GatewayConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = parse_gateway_config(&text)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    info!(path = %path.display(), "Loaded gateway configuration");
    Ok(config)
}

/// Apply command line overrides on top of the loaded configuration.
pub fn apply_overrides(mut config: GatewayConfig, args: &Args) -> GatewayConfig {
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    config
}
