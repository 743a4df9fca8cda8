//! Quote snapshot.

use serde::{Deserialize, Serialize};

/// A two-sided quote for an instrument.
///
/// Quotes are ephemeral: fetched per decision, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol.
    pub instrument: String,
    /// Best ask price.
    pub ask: f64,
    /// Best bid price.
    pub bid: f64,
}

impl Quote {
    pub fn new(instrument: impl Into<String>, ask: f64, bid: f64) -> Self {
        Self {
            instrument: instrument.into(),
            ask,
            bid,
        }
    }

    /// Mid price.
    pub fn mid(&self) -> f64 {
        (self.ask + self.bid) / 2.0
    }

    /// Spread in raw price units.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_price() {
        let quote = Quote::new("USDJPY", 145.503, 145.497);
        assert!((quote.mid() - 145.5).abs() < 1e-9);
    }

    #[test]
    fn test_spread() {
        let quote = Quote::new("USDJPY", 145.503, 145.497);
        assert!((quote.spread() - 0.006).abs() < 1e-9);
    }
}
