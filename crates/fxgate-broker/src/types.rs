//! Wire types for the brokerage OpenAPI.

use fxgate_core::OrderRequest;
use serde::{Deserialize, Serialize};

/// OAuth token response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Two-sided price fields inside a quote envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuoteFields {
    pub ask: f64,
    pub bid: f64,
}

/// Quote endpoint envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuoteEnvelope {
    pub quote: QuoteFields,
}

/// Day-order duration marker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderDurationBody {
    pub duration_type: String,
}

/// Order placement / precheck request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderBody {
    pub account_key: String,
    pub asset_type: String,
    /// Amount in lots, serialized as a string per the API schema.
    pub amount: String,
    pub amount_type: String,
    pub buy_sell: String,
    pub order_type: String,
    pub uic: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub order_duration: OrderDurationBody,
}

impl OrderBody {
    /// Build the wire body for an order request.
    pub fn from_request(account_key: &str, order: &OrderRequest) -> Self {
        let price = match order.order_type {
            fxgate_core::OrderType::Market => None,
            fxgate_core::OrderType::Limit => order.price.map(|p| p.to_string()),
        };
        Self {
            account_key: account_key.to_string(),
            asset_type: "FxSpot".to_string(),
            amount: order.amount.to_string(),
            amount_type: "Lots".to_string(),
            buy_sell: order.side.as_str().to_string(),
            order_type: order.order_type.as_str().to_string(),
            uic: order.instrument.uic,
            price,
            order_duration: OrderDurationBody {
                duration_type: order.duration.as_str().to_string(),
            },
        }
    }
}

/// A blocking disclaimer reference in a precheck response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Disclaimer {
    pub id: String,
}

/// Precheck endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrecheckResponse {
    #[serde(default)]
    pub pre_check_result: Option<String>,
    #[serde(default)]
    pub estimated_cash_required: Option<f64>,
    #[serde(default)]
    pub blocking_disclaimers: Vec<Disclaimer>,
}

impl PrecheckResponse {
    /// Ids of disclaimers that must be accepted before placement.
    pub fn blocking_disclaimer_ids(&self) -> Vec<String> {
        self.blocking_disclaimers
            .iter()
            .map(|d| d.id.clone())
            .collect()
    }
}

/// Order placement response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderResponse {
    pub order_id: String,
}

/// Order status response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderStatusResponse {
    pub order_id: String,
    pub status: String,
}

/// Account balance response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BalanceResponse {
    pub total_value: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// One instrument entry from the reference-data endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstrumentDetail {
    pub identifier: u32,
    pub symbol: String,
}

/// Reference-data endpoint envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstrumentsResponse {
    #[serde(default)]
    pub data: Vec<InstrumentDetail>,
}
