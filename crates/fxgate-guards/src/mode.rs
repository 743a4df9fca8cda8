//! ModeGuard: pauses trading when the market regime flips too often.
//!
//! Tracks the 4-valued trading mode and a sliding window of transitions.
//! Only HV to LV transitions count toward the limit; LV to HV and same-tier
//! moves are regime bookkeeping, not instability.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fxgate_core::{Clock, SystemClock, TradingMode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// ModeGuard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeGuardConfig {
    /// HV to LV transitions allowed inside the window before pausing.
    #[serde(default = "default_transition_limit")]
    pub transition_limit: usize,
    /// Sliding window in seconds.
    #[serde(default = "default_time_window_seconds")]
    pub time_window_seconds: u64,
    /// Pause duration in seconds once the limit is reached.
    #[serde(default = "default_pause_seconds")]
    pub pause_seconds: u64,
}

fn default_transition_limit() -> usize {
    3
}

fn default_time_window_seconds() -> u64 {
    900
}

fn default_pause_seconds() -> u64 {
    900
}

impl Default for ModeGuardConfig {
    fn default() -> Self {
        Self {
            transition_limit: default_transition_limit(),
            time_window_seconds: default_time_window_seconds(),
            pause_seconds: default_pause_seconds(),
        }
    }
}

/// A recorded mode transition.
#[derive(Debug, Clone)]
pub struct ModeTransition {
    pub from_mode: TradingMode,
    pub to_mode: TradingMode,
    pub timestamp: Instant,
}

impl ModeTransition {
    fn is_hv_to_lv(&self) -> bool {
        self.from_mode.is_high_volatility() && !self.to_mode.is_high_volatility()
    }
}

/// Market-regime transition monitor.
pub struct ModeGuard {
    config: ModeGuardConfig,
    clock: Arc<dyn Clock>,
    /// Append-only within the window; pruned lazily on each transition.
    transitions: VecDeque<ModeTransition>,
    current_mode: TradingMode,
    pause_until: Option<Instant>,
}

impl Default for ModeGuard {
    fn default() -> Self {
        Self::new(ModeGuardConfig::default())
    }
}

impl ModeGuard {
    pub fn new(config: ModeGuardConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ModeGuardConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            transitions: VecDeque::new(),
            // Safest regime until told otherwise.
            current_mode: TradingMode::LvLl,
            pause_until: None,
        }
    }

    /// Register a mode transition.
    ///
    /// Returns `true` if trading may continue, `false` while paused or when
    /// this transition trips the limit. The current mode is updated on every
    /// distinct transition, including the one that triggers the pause: the
    /// pause blocks future trading, not the mode bookkeeping.
    pub fn transition_mode(&mut self, new_mode: TradingMode) -> bool {
        let now = self.clock.now();

        if let Some(pause_until) = self.pause_until {
            if now < pause_until {
                warn!(
                    remaining_s = (pause_until - now).as_secs(),
                    "ModeGuard paused, rejecting transition"
                );
                return false;
            }
        }

        if self.current_mode == new_mode {
            return true;
        }

        let transition = ModeTransition {
            from_mode: self.current_mode,
            to_mode: new_mode,
            timestamp: now,
        };
        self.transitions.push_back(transition);

        let window = Duration::from_secs(self.config.time_window_seconds);
        while let Some(front) = self.transitions.front() {
            if now.duration_since(front.timestamp) > window {
                self.transitions.pop_front();
            } else {
                break;
            }
        }

        let hv_to_lv_count = self.transitions.iter().filter(|t| t.is_hv_to_lv()).count();

        let from_mode = self.current_mode;
        self.current_mode = new_mode;

        if hv_to_lv_count >= self.config.transition_limit {
            warn!(
                hv_to_lv_count,
                window_s = self.config.time_window_seconds,
                "ModeGuard triggered: regime flipping too often, pausing"
            );
            self.pause_until = Some(now + Duration::from_secs(self.config.pause_seconds));
            return false;
        }

        info!(from = %from_mode, to = %new_mode, "Mode transition");
        true
    }

    /// Whether trading is currently paused by this guard.
    pub fn is_paused(&self) -> bool {
        match self.pause_until {
            Some(until) => self.clock.now() < until,
            None => false,
        }
    }

    pub fn current_mode(&self) -> TradingMode {
        self.current_mode
    }
}
