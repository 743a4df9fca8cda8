//! Core domain types for the fxgate trading bot.
//!
//! This crate provides the fundamental types used throughout the system:
//! - `Instrument`: FX symbol with resolved UIC and pip convention
//! - `Quote`, `OrderRequest`: trading primitives
//! - `TradingMode`, `BotPriority`, `BotState`: guard state enums
//! - `OrderOutcome`, `GuardKind`: decision results
//! - `Clock`: injectable time source for time-dependent guards

pub mod clock;
pub mod error;
pub mod instrument;
pub mod order;
pub mod outcome;
pub mod quote;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, Result};
pub use instrument::Instrument;
pub use order::{BotPriority, BotState, OrderDuration, OrderRequest, OrderSide, OrderType, TradingMode};
pub use outcome::{GuardKind, OrderOutcome};
pub use quote::Quote;
