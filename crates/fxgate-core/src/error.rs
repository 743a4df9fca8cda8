//! Error types for fxgate-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid instrument: {0}")]
    InvalidInstrument(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
