//! Risk guards for the fxgate trading bot.
//!
//! Every outbound order passes a chain of independent guards before it may
//! reach the brokerage:
//! - `SlippageGuard`: adaptive statistical slippage threshold per instrument
//! - `LatencyGuard`: edge-triggered latch on persistently high latency
//! - `ModeGuard`: pauses trading when the market regime flips too often
//! - `KillSwitch`: suspends trading on daily drawdown breach
//! - `PriorityGuard`: arbitrates concurrently-running bot instances
//!
//! Guards never mutate order data and never return errors for rejections;
//! each check produces an accept/reject verdict the caller acts on.

pub mod kill_switch;
pub mod latency;
pub mod mode;
pub mod priority;
pub mod slippage;

pub use kill_switch::{KillSwitch, KillSwitchConfig};
pub use latency::{LatencyGuard, LatencyGuardConfig};
pub use mode::{ModeGuard, ModeGuardConfig, ModeTransition};
pub use priority::PriorityGuard;
pub use slippage::{SlippageGuard, SlippageGuardConfig};
