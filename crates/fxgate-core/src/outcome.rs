//! Decision outcomes: guard verdicts, precheck results, terminal order states.

use serde::{Deserialize, Serialize};

/// Identifies which guard produced a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardKind {
    Slippage,
    Latency,
    Mode,
    KillSwitch,
    Priority,
}

impl GuardKind {
    /// Stable label for metrics and journal records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slippage => "slippage",
            Self::Latency => "latency",
            Self::Mode => "mode",
            Self::KillSwitch => "kill_switch",
            Self::Priority => "priority",
        }
    }
}

impl std::fmt::Display for GuardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal classification of a submitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderOutcome {
    Filled,
    Executed,
    Rejected,
    Cancelled,
    Expired,
    /// Polling ceiling reached without a terminal status. Outcome unknown,
    /// which is distinct from a rejection.
    Timeout,
}

impl OrderOutcome {
    /// Parse a brokerage status string. Unknown statuses (e.g. "Working")
    /// are non-terminal and return `None`.
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "Filled" => Some(Self::Filled),
            "Executed" => Some(Self::Executed),
            "Rejected" => Some(Self::Rejected),
            "Cancelled" => Some(Self::Cancelled),
            "Expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Terminal success: the order reached the market.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Filled | Self::Executed)
    }

    /// Terminal failure (not timeout).
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filled => "filled",
            Self::Executed => "executed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for OrderOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
