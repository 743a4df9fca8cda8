//! Prometheus metrics for the fxgate bot.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration
//! failure means duplicate metric names, a fatal configuration error that
//! should crash at startup rather than fail silently. These panics only
//! occur during static initialization, never at runtime.

use fxgate_core::{GuardKind, OrderOutcome};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_gauge,
    CounterVec, GaugeVec, HistogramVec, IntGauge,
};

/// Terminal order classifications (including timeout).
/// Labels: outcome, instrument.
pub static ORDER_OUTCOME_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxgate_order_outcome_total",
        "Terminal order classifications",
        &["outcome", "instrument"]
    )
    .unwrap()
});

/// Guard rejections by guard name.
pub static GUARD_REJECTION_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxgate_guard_rejection_total",
        "Orders rejected by a risk guard",
        &["guard"]
    )
    .unwrap()
});

/// Guard activation state (1 = engaged, 0 = clear).
pub static GUARD_ACTIVE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "fxgate_guard_active",
        "Guard activation state (1=engaged)",
        &["guard"]
    )
    .unwrap()
});

/// Brokerage request round-trip latency in milliseconds.
pub static REQUEST_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "fxgate_request_latency_ms",
        "Brokerage request round-trip latency in milliseconds",
        &["endpoint"],
        vec![1.0, 2.0, 5.0, 10.0, 12.0, 20.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Retried brokerage requests by retry class.
/// Labels: class (rate_limit/server_error/network).
pub static API_RETRY_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "fxgate_api_retry_total",
        "Retried brokerage requests",
        &["class"]
    )
    .unwrap()
});

/// Process lifecycle state (0=INIT, 1=IDLE, 2=RUNNING, 3=PAUSED, 4=EM_STOP).
pub static BOT_STATE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "fxgate_bot_state",
        "Process lifecycle state (0=INIT, 1=IDLE, 2=RUNNING, 3=PAUSED, 4=EM_STOP)"
    )
    .unwrap()
});

/// Record a terminal (or timeout) order classification.
pub fn record_order_outcome(outcome: OrderOutcome, instrument: &str) {
    ORDER_OUTCOME_TOTAL
        .with_label_values(&[outcome.as_str(), instrument])
        .inc();
}

/// Record a guard rejection.
pub fn record_guard_rejection(guard: GuardKind) {
    GUARD_REJECTION_TOTAL
        .with_label_values(&[guard.as_str()])
        .inc();
}

/// Publish a guard's activation state.
pub fn set_guard_active(guard: GuardKind, active: bool) {
    GUARD_ACTIVE
        .with_label_values(&[guard.as_str()])
        .set(if active { 1.0 } else { 0.0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_outcome_counter_increments() {
        let before = ORDER_OUTCOME_TOTAL
            .with_label_values(&["filled", "USDJPY"])
            .get();
        record_order_outcome(OrderOutcome::Filled, "USDJPY");
        let after = ORDER_OUTCOME_TOTAL
            .with_label_values(&["filled", "USDJPY"])
            .get();
        assert!((after - before - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_guard_rejection_counter_increments() {
        let before = GUARD_REJECTION_TOTAL.with_label_values(&["mode"]).get();
        record_guard_rejection(GuardKind::Mode);
        let after = GUARD_REJECTION_TOTAL.with_label_values(&["mode"]).get();
        assert!((after - before - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_guard_gauge_reflects_state() {
        set_guard_active(GuardKind::KillSwitch, true);
        assert_eq!(
            GUARD_ACTIVE.with_label_values(&["kill_switch"]).get(),
            1.0
        );
        set_guard_active(GuardKind::KillSwitch, false);
        assert_eq!(
            GUARD_ACTIVE.with_label_values(&["kill_switch"]).get(),
            0.0
        );
    }
}
