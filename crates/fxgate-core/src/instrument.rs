//! FX instrument identification.

use serde::{Deserialize, Serialize};

/// Default pip factor for 3-decimal (JPY-style) quoting:
/// one pip = 0.001, so price-difference * 1000 = pips.
pub const DEFAULT_PIP_FACTOR: f64 = 1000.0;

/// An FX instrument: human-readable symbol plus the brokerage's numeric UIC.
///
/// The pip factor converts a raw price difference into pips and is
/// configurable per instrument (10000.0 for 5-decimal majors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Symbol, e.g. "USDJPY".
    pub symbol: String,
    /// Brokerage universal instrument code.
    pub uic: u32,
    /// Price-difference to pip multiplier.
    #[serde(default = "default_pip_factor")]
    pub pip_factor: f64,
}

fn default_pip_factor() -> f64 {
    DEFAULT_PIP_FACTOR
}

impl Instrument {
    /// Create an instrument with the default JPY-style pip factor.
    pub fn new(symbol: impl Into<String>, uic: u32) -> Self {
        Self {
            symbol: symbol.into(),
            uic,
            pip_factor: DEFAULT_PIP_FACTOR,
        }
    }

    /// Create an instrument with an explicit pip factor.
    pub fn with_pip_factor(symbol: impl Into<String>, uic: u32, pip_factor: f64) -> Self {
        Self {
            symbol: symbol.into(),
            uic,
            pip_factor,
        }
    }

    /// Convert an absolute price difference into pips.
    pub fn pips(&self, price_diff: f64) -> f64 {
        price_diff.abs() * self.pip_factor
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
