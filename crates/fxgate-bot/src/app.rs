//! Application lifecycle and the sequential trading loop.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use fxgate_broker::{BrokerApi, BrokerClient, BrokerConfig, UicMap};
use fxgate_core::{BotState, Instrument, OrderOutcome, OrderRequest};
use fxgate_engine::{
    wait_for_order_status, GuardChain, PlacementDecision, TradeJournal, TradeRecord, WaitConfig,
};
use fxgate_telemetry::metrics::BOT_STATE;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Process lifecycle. Start state is `Init`; a successful initialization
/// moves to `Idle`, trading happens in `Running`, and `EmStop` is the
/// terminal emergency state until an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Init,
    Idle,
    Running,
    Paused,
    EmStop,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::EmStop => "EM_STOP",
        }
    }

    fn gauge_value(&self) -> i64 {
        match self {
            Self::Init => 0,
            Self::Idle => 1,
            Self::Running => 2,
            Self::Paused => 3,
            Self::EmStop => 4,
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The bot: one brokerage client, one guard chain, one trading loop.
pub struct Application {
    config: AppConfig,
    state: Lifecycle,
    client: BrokerClient,
    chain: GuardChain,
    journal: TradeJournal,
    uic_map: UicMap,
    instruments: Vec<Instrument>,
    wait: WaitConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let environment = config.environment()?;
        let mut broker_config = BrokerConfig::from_env(environment);
        broker_config.use_trade_v3 = config.use_trade_v3;
        let client = BrokerClient::new(broker_config)?;

        let chain = GuardChain::new(config.guards.clone());
        let journal = TradeJournal::new(&config.journal_dir);
        let wait = WaitConfig {
            max_wait: Duration::from_secs(config.polling.max_wait_seconds),
            poll_interval: Duration::from_secs(config.polling.poll_interval_seconds),
        };

        let mut app = Self {
            config,
            state: Lifecycle::Init,
            client,
            chain,
            journal,
            uic_map: UicMap::new(),
            instruments: Vec::new(),
            wait,
        };
        app.set_state(Lifecycle::Init);
        Ok(app)
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    fn set_state(&mut self, next: Lifecycle) {
        if self.state != next {
            info!(from = %self.state, to = %next, "Lifecycle transition");
        }
        self.state = next;
        BOT_STATE.set(next.gauge_value());
    }

    /// Authenticate, resolve instruments, baseline the kill switch and
    /// build a fresh guard chain. `Init` -> `Idle` on success.
    pub async fn init(&mut self) -> AppResult<()> {
        if !self.client.authenticate().await? {
            return Err(AppError::AuthenticationFailed);
        }

        self.instruments = self.resolve_instruments().await?;

        // The guard chain is rebuilt on every initialization so a restart
        // never inherits stale history or a stale latch.
        self.chain = GuardChain::new(self.config.guards.clone());
        let equity = self.client.get_balance().await?;
        self.chain.kill_switch.set_initial_equity(equity);
        info!(equity, "Day-initial equity set");

        self.chain
            .priority
            .register_bot(&self.config.bot_id, self.config.priority);

        self.set_state(Lifecycle::Idle);
        Ok(())
    }

    async fn resolve_instruments(&mut self) -> AppResult<Vec<Instrument>> {
        let mut instruments = Vec::with_capacity(self.config.instruments.len());

        for entry in self.config.instruments.clone() {
            let uic = match entry.uic {
                Some(uic) => {
                    self.uic_map.insert(entry.symbol.clone(), uic);
                    uic
                }
                None => self
                    .uic_map
                    .get_uic(&self.client, &entry.symbol)
                    .await?
                    .ok_or_else(|| {
                        AppError::Config(format!("UIC not found for symbol {}", entry.symbol))
                    })?,
            };

            let instrument = match entry.pip_factor {
                Some(pip_factor) => Instrument::with_pip_factor(&entry.symbol, uic, pip_factor),
                None => Instrument::new(&entry.symbol, uic),
            };
            info!(symbol = %instrument.symbol, uic, "Instrument resolved");
            instruments.push(instrument);
        }

        Ok(instruments)
    }

    /// `Idle` or `Paused` -> `Running`.
    pub fn start(&mut self) {
        match self.state {
            Lifecycle::Idle | Lifecycle::Paused => {
                self.set_state(Lifecycle::Running);
                self.chain
                    .priority
                    .update_bot_state(&self.config.bot_id, BotState::Running);
            }
            other => warn!(state = %other, "start() ignored in this state"),
        }
    }

    /// `Running` -> `Paused`.
    pub fn pause(&mut self) {
        if self.state == Lifecycle::Running {
            self.set_state(Lifecycle::Paused);
            self.chain
                .priority
                .update_bot_state(&self.config.bot_id, BotState::Paused);
        } else {
            warn!(state = %self.state, "pause() ignored in this state");
        }
    }

    /// `Paused` -> `Running`.
    pub fn resume(&mut self) {
        if self.state == Lifecycle::Paused {
            self.set_state(Lifecycle::Running);
            self.chain
                .priority
                .update_bot_state(&self.config.bot_id, BotState::Running);
        } else {
            warn!(state = %self.state, "resume() ignored in this state");
        }
    }

    /// Any state -> `EmStop`. Trading halts until `reset()`.
    pub fn emergency_stop(&mut self) {
        error!("EMERGENCY STOP");
        self.set_state(Lifecycle::EmStop);
        self.chain
            .priority
            .update_bot_state(&self.config.bot_id, BotState::Stopped);
    }

    /// `EmStop` -> `Init`. A new `init()` is required before trading.
    pub fn reset(&mut self) {
        if self.state == Lifecycle::EmStop {
            self.set_state(Lifecycle::Init);
        } else {
            warn!(state = %self.state, "reset() ignored in this state");
        }
    }

    /// Main loop: one cycle per tick while `Running`. A failed cycle is
    /// logged and skipped; it never takes the process down. Ctrl-C
    /// triggers the emergency stop and exits the loop.
    pub async fn run(&mut self) -> AppResult<()> {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.cycle_interval_seconds));

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    self.emergency_stop();
                    return Ok(());
                }
                _ = interval.tick() => {
                    match self.state {
                        Lifecycle::Running => {
                            if let Err(e) = self.run_cycle().await {
                                error!(error = %e, "Trading cycle failed, skipping");
                            }
                        }
                        Lifecycle::EmStop => return Ok(()),
                        _ => debug!(state = %self.state, "Not running, cycle skipped"),
                    }
                }
            }
        }
    }

    /// One trading cycle: balance, then one candidate order per instrument
    /// through the guard chain, journaled end to end.
    async fn run_cycle(&mut self) -> AppResult<()> {
        if self.chain.priority.get_bot_state(&self.config.bot_id) != BotState::Running {
            debug!(bot_id = %self.config.bot_id, "Paused by priority registry, cycle skipped");
            return Ok(());
        }

        let equity = self.client.get_balance().await?;

        for instrument in self.instruments.clone() {
            let order = OrderRequest::market(instrument, self.config.side, self.config.amount_lots);

            let decision = self.chain.place_order(&self.client, &order, equity).await?;
            let mut record = TradeRecord::new(&order, &decision);

            if let PlacementDecision::Placed { ref order_id } = decision {
                let outcome = wait_for_order_status(
                    &self.client,
                    order_id,
                    &order.instrument.symbol,
                    &self.wait,
                )
                .await?;

                // Unknown fate at the polling ceiling: try to cancel so a
                // day order cannot fill behind our back.
                if outcome == OrderOutcome::Timeout {
                    warn!(order_id, "Order unresolved at polling ceiling, cancelling");
                    if let Err(e) = self.client.cancel_order(order_id).await {
                        error!(order_id, error = %e, "Cancel request failed");
                    }
                }

                record = record.with_outcome(outcome.as_str());
            }

            self.journal.append(&record)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_app() -> (Application, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            journal_dir: dir.path().to_str().unwrap().to_string(),
            ..AppConfig::default()
        };
        (Application::new(config).unwrap(), dir)
    }

    #[test]
    fn test_starts_in_init() {
        let (app, _dir) = test_app();
        assert_eq!(app.state(), Lifecycle::Init);
    }

    #[test]
    fn test_cannot_start_from_init() {
        let (mut app, _dir) = test_app();
        app.start();
        assert_eq!(app.state(), Lifecycle::Init);
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let (mut app, _dir) = test_app();
        // Force Idle as if init() succeeded.
        app.set_state(Lifecycle::Idle);

        app.start();
        assert_eq!(app.state(), Lifecycle::Running);
        app.pause();
        assert_eq!(app.state(), Lifecycle::Paused);
        app.resume();
        assert_eq!(app.state(), Lifecycle::Running);
    }

    #[test]
    fn test_emergency_stop_from_any_state_then_reset() {
        let (mut app, _dir) = test_app();
        app.set_state(Lifecycle::Idle);
        app.start();

        app.emergency_stop();
        assert_eq!(app.state(), Lifecycle::EmStop);

        // Trading controls are inert until reset.
        app.start();
        assert_eq!(app.state(), Lifecycle::EmStop);
        app.resume();
        assert_eq!(app.state(), Lifecycle::EmStop);

        app.reset();
        assert_eq!(app.state(), Lifecycle::Init);
    }

    #[test]
    fn test_reset_only_from_em_stop() {
        let (mut app, _dir) = test_app();
        app.set_state(Lifecycle::Idle);
        app.reset();
        assert_eq!(app.state(), Lifecycle::Idle);
    }
}
