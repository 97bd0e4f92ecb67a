//! AdminTable server entry point.

use anyhow::{Context, Result};
use at_runtime::config::{apply_overrides, load_gateway_config, Args};
use at_runtime::AdminRuntime;
use at_telemetry::{init_logging, TelemetryConfig};
use clap::Parser;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = load_gateway_config(args.config.as_deref())?;
    let config = apply_overrides(config, &args);

    let runtime = AdminRuntime::new(config, args.live_interval())?;

    info!("AdminTable is running. Press Ctrl+C to stop.");
    runtime
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            info!("Initiating graceful shutdown...");
        })
        .await
}
