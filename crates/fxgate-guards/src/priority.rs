//! PriorityGuard: arbitration among concurrently-running bot instances.
//!
//! A HIGH-priority bot running forces running NORMAL and LOW bots to
//! paused; a NORMAL bot running forces running LOW bots to paused. Rules
//! are re-applied in full on every state change, so application is
//! idempotent.

use std::collections::HashMap;

use fxgate_core::{BotPriority, BotState};
use tracing::{info, warn};

/// Registry of bot instances keyed by bot id.
#[derive(Default)]
pub struct PriorityGuard {
    bots: HashMap<String, (BotPriority, BotState)>,
}

impl PriorityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bot. Initial state is `Stopped`.
    pub fn register_bot(&mut self, bot_id: &str, priority: BotPriority) {
        self.bots
            .insert(bot_id.to_string(), (priority, BotState::Stopped));
        info!(bot_id, priority = priority.as_str(), "Registered bot");
    }

    /// Update a bot's state, then re-apply the priority rules globally.
    pub fn update_bot_state(&mut self, bot_id: &str, state: BotState) {
        let Some(entry) = self.bots.get_mut(bot_id) else {
            warn!(bot_id, "Bot not registered, ignoring state update");
            return;
        };
        entry.1 = state;
        info!(bot_id, state = state.as_str(), "Bot state updated");

        self.apply_priority_rules();
    }

    /// Current state for a bot.
    ///
    /// Unregistered ids resolve to `Stopped`: a fail-safe default, not an
    /// error.
    pub fn get_bot_state(&self, bot_id: &str) -> BotState {
        match self.bots.get(bot_id) {
            Some((_, state)) => *state,
            None => {
                warn!(bot_id, "Bot not registered, reporting STOPPED");
                BotState::Stopped
            }
        }
    }

    fn any_running(&self, priority: BotPriority) -> bool {
        self.bots
            .values()
            .any(|(p, s)| *p == priority && *s == BotState::Running)
    }

    fn pause_running_below(&mut self, ceiling: BotPriority) {
        for (bot_id, (priority, state)) in self.bots.iter_mut() {
            if *priority > ceiling && *state == BotState::Running {
                *state = BotState::Paused;
                info!(
                    bot_id,
                    priority = priority.as_str(),
                    ceiling = ceiling.as_str(),
                    "Paused lower-priority bot"
                );
            }
        }
    }

    fn apply_priority_rules(&mut self) {
        if self.any_running(BotPriority::High) {
            self.pause_running_below(BotPriority::High);
        }
        if self.any_running(BotPriority::Normal) {
            self.pause_running_below(BotPriority::Normal);
        }
    }
}
