//! Logging and metrics for the fxgate trading bot.
//!
//! Provides:
//! - `init_logging`: tracing subscriber setup (JSON in production)
//! - Prometheus metrics for order outcomes, guard rejections and
//!   activation state, brokerage request latency, and retries

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
