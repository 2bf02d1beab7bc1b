//! # Ledger Telemetry
//!
//! Structured logging and Prometheus metrics for the trade ledger node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `trade-ledger` | Service name in logs |
//! | `TL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `TL_CONSOLE_OUTPUT` | `true` | Write logs to stderr |
//! | `TL_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{gather_text, record_invocation, register_metrics, InvocationTimer};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the log subscriber.
///
/// The returned guard should live as long as the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
