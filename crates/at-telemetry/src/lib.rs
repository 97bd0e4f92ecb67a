//! # AT Telemetry
//!
//! Structured logging for AdminTable services, built on `tracing` and
//! `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use at_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // spans and events are now printed
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AT_SERVICE_NAME` | `admin-table` | Service name in the startup log |
//! | `AT_LOG_LEVEL` / `RUST_LOG` | `info` | `EnvFilter` directives |
//! | `AT_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install log subscriber: {0}")]
    Init(String),
}
