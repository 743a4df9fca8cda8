//! Error types for fxgate-engine.

use thiserror::Error;

/// Engine error types.
///
/// Guard rejections are not errors; they are `PlacementDecision` values.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Rejected before the guard chain: {0}")]
    InvalidOrder(#[from] fxgate_core::CoreError),

    #[error("Brokerage error: {0}")]
    Broker(#[from] fxgate_broker::BrokerError),

    #[error("Journal I/O error: {0}")]
    Journal(#[from] std::io::Error),

    #[error("Journal serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
