//! Guard chain / precheck orchestrator.
//!
//! # Gate order (strict)
//!
//! 1. KillSwitch latched          → GuardRejected(KillSwitch)
//! 2. KillSwitch.check_equity     → GuardRejected(KillSwitch)
//! 3. ModeGuard paused            → GuardRejected(Mode)
//! 4. LatencyGuard latched        → GuardRejected(Latency)
//! 5. Quote fetch fails           → QuoteUnavailable (fail closed)
//! 6. SlippageGuard estimate      → GuardRejected(Slippage)
//! 7. Precheck round-trip latency → GuardRejected(Latency)
//! 8. Blocking disclaimers        → accept all, one precheck re-run
//! 9. (all passed)                → submit
//!
//! Every rejection is terminal for the attempt. Transient HTTP failures are
//! retried underneath this chain by the broker client, never here.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tracing::{debug, info, warn};

use fxgate_broker::{BrokerApi, PrecheckResponse};
use fxgate_core::{Clock, GuardKind, OrderRequest, OrderSide};
use fxgate_guards::{
    KillSwitch, KillSwitchConfig, LatencyGuard, LatencyGuardConfig, ModeGuard, ModeGuardConfig,
    PriorityGuard, SlippageGuard, SlippageGuardConfig,
};
use fxgate_telemetry::metrics::{record_guard_rejection, set_guard_active};

use crate::error::EngineResult;

/// Combined configuration for the four order-path guards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardChainConfig {
    #[serde(default)]
    pub slippage: SlippageGuardConfig,
    #[serde(default)]
    pub latency: LatencyGuardConfig,
    #[serde(default)]
    pub mode: ModeGuardConfig,
    #[serde(default)]
    pub kill_switch: KillSwitchConfig,
}

/// Outcome of one order attempt through the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementDecision {
    /// Order submitted; carries the brokerage order id.
    Placed { order_id: String },
    /// A guard vetoed the attempt.
    GuardRejected { guard: GuardKind, reason: String },
    /// Quote retrieval returned nothing; the chain fails closed.
    QuoteUnavailable,
    /// The brokerage precheck refused the order (non-Ok result, failed
    /// disclaimer acceptance, or disclaimers persisting after the re-run).
    PrecheckRefused { reason: String },
}

impl PlacementDecision {
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed { .. })
    }
}

/// The five guards plus the short-circuit order-attempt state machine.
///
/// Owned and mutated by a single trading loop; no internal locking.
pub struct GuardChain {
    pub slippage: SlippageGuard,
    pub latency: LatencyGuard,
    pub mode: ModeGuard,
    pub kill_switch: KillSwitch,
    pub priority: PriorityGuard,
}

impl GuardChain {
    pub fn new(config: GuardChainConfig) -> Self {
        Self {
            slippage: SlippageGuard::new(config.slippage),
            latency: LatencyGuard::new(config.latency),
            mode: ModeGuard::new(config.mode),
            kill_switch: KillSwitch::new(config.kill_switch),
            priority: PriorityGuard::new(),
        }
    }

    /// Construct with an injected clock for the time-based guards.
    pub fn with_clock(config: GuardChainConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            slippage: SlippageGuard::new(config.slippage),
            latency: LatencyGuard::new(config.latency),
            mode: ModeGuard::with_clock(config.mode, Arc::clone(&clock)),
            kill_switch: KillSwitch::with_clock(config.kill_switch, clock),
            priority: PriorityGuard::new(),
        }
    }

    /// Record the realized slippage of a fill into the guard history.
    pub fn record_fill(&mut self, order: &OrderRequest, quote_mid: f64, fill_price: f64) {
        let pips = order.instrument.pips(fill_price - quote_mid);
        self.slippage.add_slippage(&order.instrument.symbol, pips);
    }

    fn reject(&self, guard: GuardKind, reason: String) -> PlacementDecision {
        warn!(guard = guard.as_str(), %reason, "Order attempt rejected");
        record_guard_rejection(guard);
        PlacementDecision::GuardRejected { guard, reason }
    }

    fn refuse(&self, reason: String) -> PlacementDecision {
        warn!(%reason, "Order attempt refused by precheck");
        PlacementDecision::PrecheckRefused { reason }
    }

    fn publish_guard_gauges(&self) {
        set_guard_active(GuardKind::KillSwitch, self.kill_switch.is_active());
        set_guard_active(GuardKind::Mode, self.mode.is_paused());
        set_guard_active(GuardKind::Latency, self.latency.is_triggered());
    }

    /// Run one order attempt through the full chain.
    ///
    /// `current_equity` feeds the kill-switch drawdown check. Guard
    /// rejections come back as decisions; `Err` means the brokerage call
    /// itself failed.
    pub async fn place_order<B: BrokerApi>(
        &mut self,
        broker: &B,
        order: &OrderRequest,
        current_equity: f64,
    ) -> EngineResult<PlacementDecision> {
        order.validate()?;
        self.publish_guard_gauges();

        if self.kill_switch.is_active() {
            return Ok(self.reject(
                GuardKind::KillSwitch,
                "kill switch suspension in effect".to_string(),
            ));
        }

        if !self.kill_switch.check_equity(current_equity) {
            set_guard_active(GuardKind::KillSwitch, true);
            return Ok(self.reject(
                GuardKind::KillSwitch,
                format!("daily drawdown limit breached at equity {current_equity:.2}"),
            ));
        }

        if self.mode.is_paused() {
            return Ok(self.reject(
                GuardKind::Mode,
                "mode guard pause in effect".to_string(),
            ));
        }

        if self.latency.is_triggered() {
            return Ok(self.reject(
                GuardKind::Latency,
                "latency guard latched".to_string(),
            ));
        }

        let quote = match broker.get_quote(&order.instrument).await? {
            Some(quote) => quote,
            None => {
                warn!(instrument = %order.instrument, "Quote unavailable, failing closed");
                return Ok(PlacementDecision::QuoteUnavailable);
            }
        };

        // Side-appropriate fill estimate: a buy crosses the ask, a sell
        // hits the bid.
        let fill_estimate = match order.side {
            OrderSide::Buy => quote.ask,
            OrderSide::Sell => quote.bid,
        };
        if !self
            .slippage
            .check_slippage(&order.instrument, quote.mid(), fill_estimate)
        {
            return Ok(self.reject(
                GuardKind::Slippage,
                format!(
                    "estimated slippage {:.3} pips over threshold",
                    order.instrument.pips(fill_estimate - quote.mid())
                ),
            ));
        }

        let precheck = match self.run_precheck(broker, order).await? {
            Ok(precheck) => precheck,
            Err(decision) => return Ok(decision),
        };
        debug!(
            cash_required = ?precheck.estimated_cash_required,
            "Precheck clean, submitting order"
        );

        let placed = broker.place_order(order).await?;
        info!(
            order_id = %placed.order_id,
            instrument = %order.instrument,
            side = %order.side,
            amount = %order.amount,
            "Order placed through guard chain"
        );
        Ok(PlacementDecision::Placed {
            order_id: placed.order_id,
        })
    }

    /// Precheck with round-trip latency feedback and bounded disclaimer
    /// handling: at most one accept-and-recheck cycle.
    async fn run_precheck<B: BrokerApi>(
        &mut self,
        broker: &B,
        order: &OrderRequest,
    ) -> EngineResult<Result<PrecheckResponse, PlacementDecision>> {
        let mut disclaimers_accepted = false;

        loop {
            let started = Instant::now();
            let precheck = broker.precheck_order(order).await?;
            let round_trip_ms = started.elapsed().as_secs_f64() * 1000.0;

            if !self.latency.check_latency(round_trip_ms) {
                return Ok(Err(self.reject(
                    GuardKind::Latency,
                    format!("precheck round trip {round_trip_ms:.1} ms tripped the latch"),
                )));
            }

            if let Some(result) = precheck.pre_check_result.as_deref() {
                if result != "Ok" {
                    return Ok(Err(self.refuse(format!("precheck result {result}"))));
                }
            }

            let disclaimers = precheck.blocking_disclaimer_ids();
            if disclaimers.is_empty() {
                return Ok(Ok(precheck));
            }

            if disclaimers_accepted {
                return Ok(Err(self.refuse(format!(
                    "{} blocking disclaimers persisted after acceptance",
                    disclaimers.len()
                ))));
            }

            info!(
                count = disclaimers.len(),
                "Precheck returned blocking disclaimers, accepting"
            );
            for disclaimer_id in &disclaimers {
                if !broker.accept_disclaimer(disclaimer_id).await? {
                    return Ok(Err(self.refuse(format!(
                        "disclaimer {disclaimer_id} acceptance failed"
                    ))));
                }
            }
            disclaimers_accepted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxgate_broker::{
        BrokerError, Disclaimer, MockBrokerApi, OrderResponse, PrecheckResponse,
    };
    use fxgate_core::{Instrument, ManualClock, Quote};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn usdjpy_order() -> OrderRequest {
        OrderRequest::market(Instrument::new("USDJPY", 42), OrderSide::Buy, dec!(0.01))
    }

    fn chain() -> GuardChain {
        GuardChain::new(GuardChainConfig::default())
    }

    fn clean_precheck() -> PrecheckResponse {
        PrecheckResponse {
            pre_check_result: Some("Ok".to_string()),
            estimated_cash_required: Some(100.0),
            blocking_disclaimers: Vec::new(),
        }
    }

    fn quote(ask: f64, bid: f64) -> Quote {
        Quote::new("USDJPY", ask, bid)
    }

    #[tokio::test]
    async fn test_wide_spread_rejects_before_precheck() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        // 1.6-pip spread puts the buy-side estimate 0.8 pips over mid,
        // past the 0.7 provisional threshold of a fresh guard.
        broker
            .expect_get_quote()
            .times(1)
            .returning(|_| Ok(Some(quote(145.5008, 145.4992))));
        broker.expect_precheck_order().times(0);
        broker.expect_place_order().times(0);

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert!(matches!(
            decision,
            PlacementDecision::GuardRejected {
                guard: GuardKind::Slippage,
                ..
            }
        ));
        // A rejected attempt leaves no trace in the slippage history.
        assert_eq!(chain.slippage.sample_count("USDJPY"), 0);
    }

    #[tokio::test]
    async fn test_clean_pass_places_order() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        broker
            .expect_get_quote()
            .times(1)
            .returning(|_| Ok(Some(quote(145.5003, 145.4997))));
        broker
            .expect_precheck_order()
            .times(1)
            .returning(|_| Ok(clean_precheck()));
        broker.expect_place_order().times(1).returning(|_| {
            Ok(OrderResponse {
                order_id: "order-1".to_string(),
            })
        });

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert_eq!(
            decision,
            PlacementDecision::Placed {
                order_id: "order-1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_kill_switch_rejects_before_any_network_call() {
        let clock = Arc::new(ManualClock::new());
        let mut chain = GuardChain::with_clock(GuardChainConfig::default(), clock);
        chain.kill_switch.set_initial_equity(100_000.0);
        // -2% drawdown latches the switch.
        assert!(!chain.kill_switch.check_equity(98_000.0));

        let mut broker = MockBrokerApi::new();
        broker.expect_get_quote().times(0);
        broker.expect_precheck_order().times(0);
        broker.expect_place_order().times(0);

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 98_000.0)
            .await
            .unwrap();

        assert!(matches!(
            decision,
            PlacementDecision::GuardRejected {
                guard: GuardKind::KillSwitch,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_equity_breach_rejects_without_quote_fetch() {
        let mut chain = chain();
        chain.kill_switch.set_initial_equity(800_000.0);

        let mut broker = MockBrokerApi::new();
        broker.expect_get_quote().times(0);

        // -1.875% is past the -1.5% limit.
        let decision = chain
            .place_order(&broker, &usdjpy_order(), 785_000.0)
            .await
            .unwrap();

        assert!(matches!(
            decision,
            PlacementDecision::GuardRejected {
                guard: GuardKind::KillSwitch,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_quote_unavailable_fails_closed() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        broker.expect_get_quote().times(1).returning(|_| Ok(None));
        broker.expect_precheck_order().times(0);
        broker.expect_place_order().times(0);

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert_eq!(decision, PlacementDecision::QuoteUnavailable);
    }

    #[tokio::test]
    async fn test_disclaimers_accepted_then_single_recheck() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        broker
            .expect_get_quote()
            .times(1)
            .returning(|_| Ok(Some(quote(145.5003, 145.4997))));

        let mut precheck_calls = 0;
        broker.expect_precheck_order().times(2).returning(move |_| {
            precheck_calls += 1;
            if precheck_calls == 1 {
                Ok(PrecheckResponse {
                    pre_check_result: Some("Ok".to_string()),
                    estimated_cash_required: None,
                    blocking_disclaimers: vec![
                        Disclaimer {
                            id: "d-1".to_string(),
                        },
                        Disclaimer {
                            id: "d-2".to_string(),
                        },
                    ],
                })
            } else {
                Ok(clean_precheck())
            }
        });
        broker
            .expect_accept_disclaimer()
            .times(2)
            .returning(|_| Ok(true));
        broker.expect_place_order().times(1).returning(|_| {
            Ok(OrderResponse {
                order_id: "order-2".to_string(),
            })
        });

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert!(decision.is_placed());
    }

    #[tokio::test]
    async fn test_persisting_disclaimers_refuse_the_attempt() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        broker
            .expect_get_quote()
            .times(1)
            .returning(|_| Ok(Some(quote(145.5003, 145.4997))));
        // Both prechecks keep reporting a blocking disclaimer; exactly
        // two calls, never a third.
        broker.expect_precheck_order().times(2).returning(|_| {
            Ok(PrecheckResponse {
                pre_check_result: Some("Ok".to_string()),
                estimated_cash_required: None,
                blocking_disclaimers: vec![Disclaimer {
                    id: "d-1".to_string(),
                }],
            })
        });
        broker
            .expect_accept_disclaimer()
            .times(1)
            .returning(|_| Ok(true));
        broker.expect_place_order().times(0);

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert!(matches!(decision, PlacementDecision::PrecheckRefused { .. }));
    }

    #[tokio::test]
    async fn test_failed_disclaimer_acceptance_aborts() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        broker
            .expect_get_quote()
            .times(1)
            .returning(|_| Ok(Some(quote(145.5003, 145.4997))));
        broker.expect_precheck_order().times(1).returning(|_| {
            Ok(PrecheckResponse {
                pre_check_result: Some("Ok".to_string()),
                estimated_cash_required: None,
                blocking_disclaimers: vec![Disclaimer {
                    id: "d-1".to_string(),
                }],
            })
        });
        broker
            .expect_accept_disclaimer()
            .times(1)
            .returning(|_| Ok(false));
        broker.expect_place_order().times(0);

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert!(matches!(decision, PlacementDecision::PrecheckRefused { .. }));
    }

    #[tokio::test]
    async fn test_latched_latency_guard_rejects_without_quote() {
        let mut chain = chain();
        for _ in 0..5 {
            chain.latency.check_latency(20.0);
        }
        assert!(chain.latency.is_triggered());

        let mut broker = MockBrokerApi::new();
        broker.expect_get_quote().times(0);

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert!(matches!(
            decision,
            PlacementDecision::GuardRejected {
                guard: GuardKind::Latency,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_mode_pause_rejects() {
        let clock = Arc::new(ManualClock::new());
        let mut chain = GuardChain::with_clock(GuardChainConfig::default(), Arc::clone(&clock) as Arc<dyn Clock>);

        // Three HV->LV transitions inside the window trip the pause.
        use fxgate_core::TradingMode;
        for _ in 0..3 {
            chain.mode.transition_mode(TradingMode::HvHl);
            clock.advance(Duration::from_secs(1));
            chain.mode.transition_mode(TradingMode::LvLl);
            clock.advance(Duration::from_secs(1));
        }
        assert!(chain.mode.is_paused());

        let mut broker = MockBrokerApi::new();
        broker.expect_get_quote().times(0);

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 100_000.0)
            .await
            .unwrap();

        assert!(matches!(
            decision,
            PlacementDecision::GuardRejected {
                guard: GuardKind::Mode,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_order_is_an_error_not_a_rejection() {
        let mut chain = chain();
        let broker = MockBrokerApi::new();

        let order = OrderRequest::market(Instrument::new("USDJPY", 42), OrderSide::Buy, dec!(0));
        let result = chain.place_order(&broker, &order, 100_000.0).await;
        assert!(matches!(result, Err(crate::EngineError::InvalidOrder(_))));
    }

    #[tokio::test]
    async fn test_broker_failure_propagates_as_error() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        broker.expect_get_quote().times(1).returning(|_| {
            Err(BrokerError::Api {
                status: 401,
                body: "token expired".to_string(),
            })
        });

        let result = chain.place_order(&broker, &usdjpy_order(), 100_000.0).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rejection_is_deterministic_across_repeats() {
        let mut chain = chain();
        let mut broker = MockBrokerApi::new();

        broker
            .expect_get_quote()
            .times(3)
            .returning(|_| Ok(Some(quote(145.5008, 145.4992))));
        broker.expect_precheck_order().times(0);

        for _ in 0..3 {
            let decision = chain
                .place_order(&broker, &usdjpy_order(), 100_000.0)
                .await
                .unwrap();
            assert!(matches!(
                decision,
                PlacementDecision::GuardRejected {
                    guard: GuardKind::Slippage,
                    ..
                }
            ));
        }
    }

    #[tokio::test]
    async fn test_rejection_increments_guard_counter() {
        use fxgate_telemetry::metrics::GUARD_REJECTION_TOTAL;

        let clock = Arc::new(ManualClock::new());
        let mut chain = GuardChain::with_clock(GuardChainConfig::default(), clock);
        chain.kill_switch.set_initial_equity(100_000.0);
        assert!(!chain.kill_switch.check_equity(98_000.0));

        let broker = MockBrokerApi::new();
        let before = GUARD_REJECTION_TOTAL
            .with_label_values(&["kill_switch"])
            .get();

        let decision = chain
            .place_order(&broker, &usdjpy_order(), 98_000.0)
            .await
            .unwrap();
        assert!(matches!(
            decision,
            PlacementDecision::GuardRejected {
                guard: GuardKind::KillSwitch,
                ..
            }
        ));

        // The counter is a process-global; concurrently running tests may
        // also bump it, so assert at least one new increment.
        let after = GUARD_REJECTION_TOTAL
            .with_label_values(&["kill_switch"])
            .get();
        assert!(after - before >= 1.0);
    }

    #[test]
    fn test_record_fill_updates_slippage_history() {
        let mut chain = chain();
        let order = usdjpy_order();

        chain.record_fill(&order, 145.500, 145.5004);
        assert_eq!(chain.slippage.sample_count("USDJPY"), 1);
        let (mean, _) = chain.slippage.stats("USDJPY");
        assert!((mean - 0.4).abs() < 1e-9);
    }
}
