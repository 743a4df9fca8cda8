//! KillSwitch: daily drawdown circuit breaker.
//!
//! Once daily loss crosses the threshold, all trading halts for a fixed
//! suspension period. The suspension is authoritative until it elapses or
//! `reset()` is called explicitly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fxgate_core::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// KillSwitch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillSwitchConfig {
    /// Daily loss threshold in percent (negative).
    #[serde(default = "default_daily_loss_threshold_pct")]
    pub daily_loss_threshold_pct: f64,
    /// Suspension duration in seconds once triggered.
    #[serde(default = "default_suspension_seconds")]
    pub suspension_seconds: u64,
}

fn default_daily_loss_threshold_pct() -> f64 {
    -1.5
}

fn default_suspension_seconds() -> u64 {
    24 * 3600
}

impl Default for KillSwitchConfig {
    fn default() -> Self {
        Self {
            daily_loss_threshold_pct: default_daily_loss_threshold_pct(),
            suspension_seconds: default_suspension_seconds(),
        }
    }
}

/// Daily drawdown monitor.
///
/// `initial_equity` is the day's baseline; resetting it once per trading day
/// is the caller's responsibility, it never auto-resets.
pub struct KillSwitch {
    config: KillSwitchConfig,
    clock: Arc<dyn Clock>,
    initial_equity: f64,
    activated_until: Option<Instant>,
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new(KillSwitchConfig::default())
    }
}

impl KillSwitch {
    pub fn new(config: KillSwitchConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: KillSwitchConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            initial_equity: 0.0,
            activated_until: None,
        }
    }

    /// Set the day's equity baseline.
    pub fn set_initial_equity(&mut self, equity: f64) {
        self.initial_equity = equity;
        info!(initial_equity = equity, "KillSwitch baseline equity set");
    }

    /// Check current equity against the daily loss threshold.
    ///
    /// Returns `true` if trading may continue. With no baseline set this is
    /// fail-open: it warns and passes rather than blocking a bot whose
    /// day-open equity was never recorded.
    pub fn check_equity(&mut self, current_equity: f64) -> bool {
        if self.initial_equity <= 0.0 {
            warn!("KillSwitch baseline equity not set, skipping drawdown check");
            return true;
        }

        let now = self.clock.now();

        if let Some(until) = self.activated_until {
            if now < until {
                warn!(
                    remaining_s = (until - now).as_secs(),
                    "KillSwitch active, trading suspended"
                );
                return false;
            }
        }

        let daily_pnl_pct = ((current_equity - self.initial_equity) / self.initial_equity) * 100.0;

        if daily_pnl_pct <= self.config.daily_loss_threshold_pct {
            error!(
                daily_pnl_pct,
                threshold_pct = self.config.daily_loss_threshold_pct,
                suspension_s = self.config.suspension_seconds,
                "KillSwitch triggered: daily loss limit breached"
            );
            self.activated_until = Some(now + Duration::from_secs(self.config.suspension_seconds));
            return false;
        }

        true
    }

    /// Whether the suspension window is currently in effect.
    ///
    /// Pure time check, independent of `check_equity`.
    pub fn is_active(&self) -> bool {
        match self.activated_until {
            Some(until) => self.clock.now() < until,
            None => false,
        }
    }

    /// Clear the suspension.
    pub fn reset(&mut self) {
        self.activated_until = None;
        info!("KillSwitch reset");
    }
}
