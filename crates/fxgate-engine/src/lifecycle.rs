//! Order lifecycle tracker: fixed-interval status polling with a hard
//! wall-clock ceiling.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use fxgate_broker::BrokerApi;
use fxgate_core::OrderOutcome;
use fxgate_telemetry::metrics::record_order_outcome;

use crate::error::EngineResult;

/// Polling parameters for `wait_for_order_status`.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Hard ceiling measured from loop entry.
    pub max_wait: Duration,
    /// Fixed interval between status polls.
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Poll an order until it reaches a terminal status or the ceiling passes.
///
/// Terminal failures (Cancelled/Rejected/Expired) come back as that outcome,
/// never folded into `Timeout`. `Timeout` means the order's fate is unknown.
/// Every return updates the outcome metrics for the instrument.
pub async fn wait_for_order_status<B: BrokerApi>(
    broker: &B,
    order_id: &str,
    instrument: &str,
    config: &WaitConfig,
) -> EngineResult<OrderOutcome> {
    let started = Instant::now();

    loop {
        let status = broker.get_order_status(order_id).await?;

        if let Some(outcome) = OrderOutcome::from_status(&status.status) {
            if outcome.is_success() {
                info!(order_id, status = %status.status, "Order reached terminal success");
            } else {
                warn!(order_id, status = %status.status, "Order reached terminal failure");
            }
            record_order_outcome(outcome, instrument);
            return Ok(outcome);
        }

        debug!(order_id, status = %status.status, "Order not terminal yet");

        if started.elapsed() + config.poll_interval >= config.max_wait {
            warn!(
                order_id,
                waited_s = started.elapsed().as_secs_f64(),
                "Order status polling timed out"
            );
            record_order_outcome(OrderOutcome::Timeout, instrument);
            return Ok(OrderOutcome::Timeout);
        }

        sleep(config.poll_interval).await;
    }
}
