//! Brokerage REST client for the fxgate trading bot.
//!
//! Provides:
//! - `BrokerClient`: authenticated REST client (quotes, precheck, orders,
//!   disclaimers, order status, balances)
//! - `BrokerApi`: the trait seam the guard-chain engine consumes
//! - `RetryPolicy`: bounded exponential backoff with jitter, separate
//!   budgets for rate-limit (429) and server-error (5xx) classes
//! - `UicMap`: symbol to UIC resolution with caching

pub mod api;
pub mod client;
pub mod error;
pub mod retry;
pub mod types;
pub mod uic_map;

pub use api::BrokerApi;
#[cfg(feature = "mocks")]
pub use api::MockBrokerApi;
pub use client::{BrokerClient, BrokerConfig, Environment};
pub use error::{BrokerError, BrokerResult};
pub use retry::RetryPolicy;
pub use types::{
    BalanceResponse, Disclaimer, OrderResponse, OrderStatusResponse, PrecheckResponse,
    TokenResponse,
};
pub use uic_map::UicMap;
