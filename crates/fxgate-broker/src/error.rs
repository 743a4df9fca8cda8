//! Error types for fxgate-broker.

use thiserror::Error;

/// Brokerage API error types.
///
/// `Api` carries the HTTP status and response body and is never retried.
/// Transient classes (429/5xx/network) are retried under a `RetryPolicy`
/// and only surface as `RetryExhausted` once the budget is spent.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Retry budget exhausted after {attempts} attempts (last status {status})")]
    RetryExhausted { attempts: u32, status: u16 },

    #[error("Not authenticated, call authenticate() first")]
    NotAuthenticated,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type alias for brokerage operations.
pub type BrokerResult<T> = std::result::Result<T, BrokerError>;
