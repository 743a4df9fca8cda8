//! FX guard-chain trading bot.
//!
//! Application that wires the pieces together:
//! - Brokerage authentication and UIC resolution
//! - Guard chain construction (fresh on every initialization)
//! - Sequential trading loop with per-cycle fault isolation
//! - Trade journaling and metrics

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, Lifecycle};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
