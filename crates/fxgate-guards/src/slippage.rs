//! SlippageGuard: adaptive statistical slippage gate.
//!
//! Rejects orders whose estimated fill deviates too far from the observed
//! quote mid-price. The threshold adapts to the trailing slippage history
//! of each instrument, with a hard floor so near-zero-variance histories
//! cannot produce an overly tight gate.

use std::collections::HashMap;
use std::collections::VecDeque;

use fxgate_core::Instrument;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// SlippageGuard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlippageGuardConfig {
    /// Ring-buffer capacity per instrument. Oldest samples are evicted.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Minimum samples before departing from the provisional statistics.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Provisional mean in pips, used below `min_samples`.
    #[serde(default = "default_provisional_mean")]
    pub provisional_mean: f64,
    /// Provisional standard deviation in pips, used below `min_samples`.
    #[serde(default = "default_provisional_std")]
    pub provisional_std: f64,
    /// Sigma multiplier in the adaptive threshold.
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f64,
    /// Threshold floor in pips.
    #[serde(default = "default_floor_pips")]
    pub floor_pips: f64,
}

fn default_window_size() -> usize {
    2000
}

fn default_min_samples() -> usize {
    10
}

fn default_provisional_mean() -> f64 {
    0.0
}

fn default_provisional_std() -> f64 {
    0.2
}

fn default_sigma_multiplier() -> f64 {
    1.5
}

fn default_floor_pips() -> f64 {
    0.7
}

impl Default for SlippageGuardConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            min_samples: default_min_samples(),
            provisional_mean: default_provisional_mean(),
            provisional_std: default_provisional_std(),
            sigma_multiplier: default_sigma_multiplier(),
            floor_pips: default_floor_pips(),
        }
    }
}

/// Per-instrument rolling slippage statistics and threshold check.
///
/// The guard has no side effects on rejection. Feeding realized fills back
/// into the history via `add_slippage` is the caller's responsibility; it
/// is not automatic.
pub struct SlippageGuard {
    config: SlippageGuardConfig,
    /// Trailing slippage samples per instrument symbol, insertion order
    /// chronological.
    history: HashMap<String, VecDeque<f64>>,
}

impl Default for SlippageGuard {
    fn default() -> Self {
        Self::new(SlippageGuardConfig::default())
    }
}

impl SlippageGuard {
    pub fn new(config: SlippageGuardConfig) -> Self {
        Self {
            config,
            history: HashMap::new(),
        }
    }

    /// Record a slippage observation for an instrument.
    pub fn add_slippage(&mut self, symbol: &str, slippage_pips: f64) {
        let window = self
            .history
            .entry(symbol.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.config.window_size));

        if window.len() == self.config.window_size {
            window.pop_front();
        }
        window.push_back(slippage_pips);

        debug!(instrument = symbol, slippage_pips, "Recorded slippage sample");
    }

    /// Trailing (mean, std) for an instrument.
    ///
    /// Falls back to the provisional statistics until `min_samples`
    /// observations are available. The standard deviation is the sample
    /// standard deviation (n-1 denominator).
    pub fn stats(&self, symbol: &str) -> (f64, f64) {
        let window = match self.history.get(symbol) {
            Some(w) if w.len() >= self.config.min_samples => w,
            _ => {
                debug!(
                    instrument = symbol,
                    "Insufficient slippage history, using provisional statistics"
                );
                return (self.config.provisional_mean, self.config.provisional_std);
            }
        };

        let n = window.len() as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = variance.sqrt();

        (mean, std)
    }

    /// Current rejection threshold in pips for an instrument.
    pub fn threshold(&self, symbol: &str) -> f64 {
        let (mean, std) = self.stats(symbol);
        (mean + self.config.sigma_multiplier * std).max(self.config.floor_pips)
    }

    /// Check estimated slippage against the adaptive threshold.
    ///
    /// Returns `true` if the order may proceed, `false` on rejection.
    pub fn check_slippage(&self, instrument: &Instrument, quote_mid: f64, fill_price: f64) -> bool {
        let slippage_pips = instrument.pips(fill_price - quote_mid);
        let threshold = self.threshold(&instrument.symbol);

        info!(
            instrument = %instrument,
            slippage_pips,
            threshold,
            "Checking estimated slippage"
        );

        if slippage_pips > threshold {
            warn!(
                instrument = %instrument,
                slippage_pips,
                threshold,
                "Excessive slippage, rejecting order"
            );
            return false;
        }

        true
    }

    /// Number of samples recorded for an instrument.
    pub fn sample_count(&self, symbol: &str) -> usize {
        self.history.get(symbol).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdjpy() -> Instrument {
        Instrument::new("USDJPY", 42)
    }

    #[test]
    fn test_provisional_threshold_below_min_samples() {
        let mut guard = SlippageGuard::default();
        // 9 samples is still below the 10-sample requirement.
        for _ in 0..9 {
            guard.add_slippage("USDJPY", 5.0);
        }
        // max(0 + 1.5*0.2, 0.7) = 0.7
        assert!((guard.threshold("USDJPY") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_zero_variance_history_keeps_floor() {
        let mut guard = SlippageGuard::default();
        for _ in 0..15 {
            guard.add_slippage("USDJPY", 0.5);
        }
        let (mean, std) = guard.stats("USDJPY");
        assert!((mean - 0.5).abs() < 1e-9);
        assert!(std.abs() < 1e-9);
        // max(0.5, 0.7) = 0.7
        assert!((guard.threshold("USDJPY") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_pass_and_reject() {
        let mut guard = SlippageGuard::default();
        for _ in 0..15 {
            guard.add_slippage("USDJPY", 0.5);
        }
        let mid = 145.500;
        // Exactly 0.7 pip (0.0007 at pip factor 1000) passes.
        assert!(guard.check_slippage(&usdjpy(), mid, mid + 0.0007));
        // 0.71 pip fails.
        assert!(!guard.check_slippage(&usdjpy(), mid, mid + 0.00071));
    }

    #[test]
    fn test_rejection_has_no_side_effects() {
        let guard = SlippageGuard::default();
        assert!(!guard.check_slippage(&usdjpy(), 145.500, 145.510));
        assert_eq!(guard.sample_count("USDJPY"), 0);
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut guard = SlippageGuard::new(SlippageGuardConfig {
            window_size: 12,
            ..Default::default()
        });
        // Fill with high slippage, then displace it with low slippage.
        for _ in 0..12 {
            guard.add_slippage("USDJPY", 10.0);
        }
        for _ in 0..12 {
            guard.add_slippage("USDJPY", 0.1);
        }
        assert_eq!(guard.sample_count("USDJPY"), 12);
        let (mean, _) = guard.stats("USDJPY");
        assert!((mean - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_instruments_are_independent() {
        let mut guard = SlippageGuard::default();
        for _ in 0..20 {
            guard.add_slippage("USDJPY", 3.0);
        }
        // EURJPY has no history: provisional threshold applies.
        assert!((guard.threshold("EURJPY") - 0.7).abs() < 1e-9);
        assert!(guard.threshold("USDJPY") > 2.9);
    }

    #[test]
    fn test_adaptive_threshold_widens_with_history() {
        let mut guard = SlippageGuard::default();
        // Alternating 1.0/2.0: mean 1.5, sample std ~0.513.
        for i in 0..20 {
            guard.add_slippage("USDJPY", if i % 2 == 0 { 1.0 } else { 2.0 });
        }
        let threshold = guard.threshold("USDJPY");
        assert!(threshold > 2.0 && threshold < 2.5, "threshold={threshold}");
    }
}
