//! LatencyGuard: edge-triggered latch on persistently high round-trip latency.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// LatencyGuard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyGuardConfig {
    /// Latency threshold in milliseconds.
    #[serde(default = "default_threshold_ms")]
    pub threshold_ms: f64,
    /// Number of consecutive samples that must all exceed the threshold.
    #[serde(default = "default_consecutive_limit")]
    pub consecutive_limit: usize,
}

fn default_threshold_ms() -> f64 {
    12.0
}

fn default_consecutive_limit() -> usize {
    5
}

impl Default for LatencyGuardConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_threshold_ms(),
            consecutive_limit: default_consecutive_limit(),
        }
    }
}

/// Latch that trips when the whole trailing window is above the threshold.
///
/// The latch is edge-triggered: the transition into the triggered state is
/// reported as a rejection, and the guard keeps rejecting while latched.
/// A window that is not uniformly high clears the latch.
pub struct LatencyGuard {
    config: LatencyGuardConfig,
    history: VecDeque<f64>,
    triggered: bool,
}

impl Default for LatencyGuard {
    fn default() -> Self {
        Self::new(LatencyGuardConfig::default())
    }
}

impl LatencyGuard {
    pub fn new(config: LatencyGuardConfig) -> Self {
        let capacity = config.consecutive_limit;
        Self {
            config,
            history: VecDeque::with_capacity(capacity),
            triggered: false,
        }
    }

    /// Record a round-trip latency sample and evaluate the latch.
    ///
    /// Returns `true` if latency is acceptable, `false` while the guard is
    /// (or becomes) triggered.
    pub fn check_latency(&mut self, latency_ms: f64) -> bool {
        if self.history.len() == self.config.consecutive_limit {
            self.history.pop_front();
        }
        self.history.push_back(latency_ms);

        if self.history.len() < self.config.consecutive_limit {
            return true;
        }

        let uniformly_high = self.history.iter().all(|l| *l > self.config.threshold_ms);

        if uniformly_high && !self.triggered {
            warn!(
                consecutive = self.config.consecutive_limit,
                threshold_ms = self.config.threshold_ms,
                "LatencyGuard triggered: window uniformly above threshold"
            );
            self.triggered = true;
            return false;
        }

        if !uniformly_high && self.triggered {
            info!("LatencyGuard cleared: latency returned to normal");
            self.triggered = false;
        }

        !self.triggered
    }

    /// Current latch state.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Clear the history and the latch.
    pub fn reset(&mut self) {
        self.history.clear();
        self.triggered = false;
        info!("LatencyGuard reset");
    }
}
