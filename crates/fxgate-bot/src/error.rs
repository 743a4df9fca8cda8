//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Brokerage error: {0}")]
    Broker(#[from] fxgate_broker::BrokerError),

    #[error("Engine error: {0}")]
    Engine(#[from] fxgate_engine::EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] fxgate_telemetry::TelemetryError),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
