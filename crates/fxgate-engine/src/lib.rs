//! Guard-chain orchestration, order lifecycle tracking and the trade journal.
//!
//! The engine owns the five risk guards and runs every order attempt through
//! them in a strict short-circuit order before the brokerage sees anything.
//! Guard rejections are values, not errors: an `Err` from this crate always
//! means infrastructure failure (transport, journal I/O), never "the guard
//! said no".

pub mod chain;
pub mod error;
pub mod journal;
pub mod lifecycle;

pub use chain::{GuardChain, GuardChainConfig, PlacementDecision};
pub use error::{EngineError, EngineResult};
pub use journal::{TradeJournal, TradeRecord};
pub use lifecycle::{wait_for_order_status, WaitConfig};
