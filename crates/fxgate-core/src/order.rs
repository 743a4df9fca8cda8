//! Order primitives and guard state enums.

use crate::error::{CoreError, Result};
use crate::instrument::Instrument;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Wire representation expected by the brokerage ("Buy"/"Sell").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Limit => "Limit",
        }
    }
}

/// Order duration. Only day orders are used on the trading path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDuration {
    #[default]
    DayOrder,
}

impl OrderDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayOrder => "DayOrder",
        }
    }
}

/// A candidate order, constructed by the caller and validated by the guard
/// chain. Guards never mutate it; they only produce verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub instrument: Instrument,
    pub side: OrderSide,
    /// Amount in lots.
    pub amount: Decimal,
    pub order_type: OrderType,
    #[serde(default)]
    pub duration: OrderDuration,
    /// Limit price; ignored for market orders.
    pub price: Option<Decimal>,
}

impl OrderRequest {
    /// Build a market order.
    pub fn market(instrument: Instrument, side: OrderSide, amount: Decimal) -> Self {
        Self {
            instrument,
            side,
            amount,
            order_type: OrderType::Market,
            duration: OrderDuration::DayOrder,
            price: None,
        }
    }

    /// Build a limit order.
    pub fn limit(instrument: Instrument, side: OrderSide, amount: Decimal, price: Decimal) -> Self {
        Self {
            instrument,
            side,
            amount,
            order_type: OrderType::Limit,
            duration: OrderDuration::DayOrder,
            price: Some(price),
        }
    }

    /// Structural validation, run before the guard chain sees the order.
    pub fn validate(&self) -> Result<()> {
        if self.instrument.symbol.is_empty() {
            return Err(CoreError::InvalidInstrument("empty symbol".to_string()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::InvalidOrder(format!(
                "non-positive amount {}",
                self.amount
            )));
        }
        if self.order_type == OrderType::Limit && self.price.is_none() {
            return Err(CoreError::InvalidOrder(
                "limit order without a price".to_string(),
            ));
        }
        Ok(())
    }
}

/// Market regime: volatility tier x liquidity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingMode {
    /// High volatility, high liquidity.
    HvHl,
    /// High volatility, low liquidity.
    HvLl,
    /// Low volatility, high liquidity.
    LvHl,
    /// Low volatility, low liquidity.
    LvLl,
}

impl TradingMode {
    pub fn is_high_volatility(&self) -> bool {
        matches!(self, Self::HvHl | Self::HvLl)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HvHl => "HV_HL",
            Self::HvLl => "HV_LL",
            Self::LvHl => "LV_HL",
            Self::LvLl => "LV_LL",
        }
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority tier of a bot instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BotPriority {
    High,
    #[default]
    Normal,
    Low,
}

impl BotPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Normal => "NORMAL",
            Self::Low => "LOW",
        }
    }
}

/// Operational state of a bot instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotState {
    Running,
    Paused,
    Stopped,
}

impl BotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_order_has_no_price() {
        let order = OrderRequest::market(Instrument::new("USDJPY", 42), OrderSide::Buy, dec!(0.01));
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.duration, OrderDuration::DayOrder);
        assert!(order.price.is_none());
    }

    #[test]
    fn test_limit_order_carries_price() {
        let order = OrderRequest::limit(
            Instrument::new("USDJPY", 42),
            OrderSide::Sell,
            dec!(0.01),
            dec!(145.500),
        );
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.price, Some(dec!(145.500)));
    }

    #[test]
    fn test_validate_accepts_well_formed_orders() {
        let order = OrderRequest::market(Instrument::new("USDJPY", 42), OrderSide::Buy, dec!(0.01));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_amount() {
        let order = OrderRequest::market(Instrument::new("USDJPY", 42), OrderSide::Buy, dec!(0));
        assert!(matches!(order.validate(), Err(CoreError::InvalidOrder(_))));
    }

    #[test]
    fn test_validate_rejects_limit_without_price() {
        let mut order =
            OrderRequest::market(Instrument::new("USDJPY", 42), OrderSide::Buy, dec!(0.01));
        order.order_type = OrderType::Limit;
        assert!(matches!(order.validate(), Err(CoreError::InvalidOrder(_))));
    }

    #[test]
    fn test_validate_rejects_empty_symbol() {
        let order = OrderRequest::market(Instrument::new("", 42), OrderSide::Buy, dec!(0.01));
        assert!(matches!(
            order.validate(),
            Err(CoreError::InvalidInstrument(_))
        ));
    }

    #[test]
    fn test_volatility_tier() {
        assert!(TradingMode::HvHl.is_high_volatility());
        assert!(TradingMode::HvLl.is_high_volatility());
        assert!(!TradingMode::LvHl.is_high_volatility());
        assert!(!TradingMode::LvLl.is_high_volatility());
    }
}
