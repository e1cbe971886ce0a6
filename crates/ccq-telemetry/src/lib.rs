//! # CCQ Telemetry
//!
//! Observability for the cross-chain query actors.
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, plain or JSON output.
//! - **Metrics**: [`CcqMetrics`], a Prometheus registry owned by the process
//!   and handed to each actor at construction. Nothing is registered globally.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CCQ_SERVICE_NAME` | `ccq` | Service name in log lines |
//! | `CCQ_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CCQ_JSON_LOGS` | `false` | Emit JSON log lines |
//! | `CCQ_NETWORK` | `testnet` | Network identifier |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{CcqMetrics, MetricsSnapshot};

use thiserror::Error;

/// Telemetry initialisation errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be created or registered.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

impl From<prometheus::Error> for TelemetryError {
    fn from(e: prometheus::Error) -> Self {
        TelemetryError::MetricsInit(e.to_string())
    }
}
