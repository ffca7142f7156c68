//! # Router Telemetry
//!
//! Structured logging and Prometheus metrics for the interaction router.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use router_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IR_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `IR_JSON_LOGS` | `false` | JSON log lines instead of pretty output |
//! | `IR_SERVICE_NAME` | `interaction-router` | Service name field |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, record_dispatch_outcome, record_handler_execution, register_metrics,
    DISPATCH_OUTCOMES,
    HANDLER_EXECUTIONS, HANDLER_LATENCY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Registers metrics, then installs the log subscriber.
///
/// Hold the guard for the life of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Logs shutdown when dropped.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
