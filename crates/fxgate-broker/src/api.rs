//! The brokerage seam consumed by the guard-chain engine.

use fxgate_core::{Instrument, OrderRequest, Quote};

use crate::error::BrokerResult;
use crate::types::{OrderResponse, OrderStatusResponse, PrecheckResponse};

/// Trading operations the engine needs from the brokerage.
///
/// `BrokerClient` is the production implementation; `MockBrokerApi`
/// (behind the `mocks` feature) backs the engine tests.
#[cfg_attr(feature = "mocks", mockall::automock)]
pub trait BrokerApi {
    /// Fetch a two-sided quote. `None` means the quote was unavailable,
    /// which the engine treats as fail-closed.
    async fn get_quote(&self, instrument: &Instrument) -> BrokerResult<Option<Quote>>;

    /// Run the brokerage order precheck.
    async fn precheck_order(&self, order: &OrderRequest) -> BrokerResult<PrecheckResponse>;

    /// Accept a blocking disclaimer by id.
    async fn accept_disclaimer(&self, disclaimer_id: &str) -> BrokerResult<bool>;

    /// Submit an order.
    async fn place_order(&self, order: &OrderRequest) -> BrokerResult<OrderResponse>;

    /// Query the current status of an order.
    async fn get_order_status(&self, order_id: &str) -> BrokerResult<OrderStatusResponse>;

    /// Cancel an order.
    async fn cancel_order(&self, order_id: &str) -> BrokerResult<bool>;
}
