//! Error types for fxgate-telemetry.

use thiserror::Error;

/// Telemetry error types.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for telemetry operations.
pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;
