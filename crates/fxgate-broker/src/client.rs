//! Authenticated REST client for the brokerage OpenAPI.

use std::time::{Duration, Instant};

use fxgate_core::{Instrument, OrderRequest, Quote};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::api::BrokerApi;
use crate::error::{BrokerError, BrokerResult};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::types::{
    BalanceResponse, InstrumentDetail, InstrumentsResponse, OrderBody, OrderResponse,
    OrderStatusResponse, PrecheckResponse, QuoteEnvelope, TokenResponse,
};
use fxgate_telemetry::metrics::REQUEST_LATENCY_MS;

/// Fixed timeout on the trading path.
const TRADING_TIMEOUT: Duration = Duration::from_secs(5);

/// Brokerage environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Simulation gateway.
    #[default]
    Sim,
    /// Production gateway.
    Live,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sim => "https://gateway.saxobank.com/sim/openapi",
            Self::Live => "https://gateway.saxobank.com/openapi",
        }
    }

    /// Environment-variable prefix for credentials.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Sim => "SIM",
            Self::Live => "LIVE",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sim" => Ok(Self::Sim),
            "live" => Ok(Self::Live),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Client configuration. Credentials come from `{SIM,LIVE}_CLIENT_ID`,
/// `_CLIENT_SECRET`, `_REFRESH_TOKEN` and `_ACCOUNT_KEY`.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub environment: Environment,
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub account_key: Option<String>,
    pub timeout: Duration,
    /// Use the v3 trade endpoints instead of v2.
    pub use_trade_v3: bool,
}

impl BrokerConfig {
    /// Read configuration from the process environment.
    pub fn from_env(environment: Environment) -> Self {
        let prefix = environment.env_prefix();
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();

        Self {
            environment,
            base_url: environment.base_url().to_string(),
            client_id: var("CLIENT_ID"),
            client_secret: var("CLIENT_SECRET"),
            refresh_token: var("REFRESH_TOKEN"),
            account_key: var("ACCOUNT_KEY"),
            timeout: TRADING_TIMEOUT,
            use_trade_v3: std::env::var("USE_TRADE_V3")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.refresh_token.is_some()
    }
}

/// REST client with refresh-token authentication and bounded retry.
pub struct BrokerClient {
    config: BrokerConfig,
    http: Client,
    access_token: Option<String>,
    rate_limit: RetryPolicy,
    server_error: RetryPolicy,
}

impl BrokerClient {
    pub fn new(config: BrokerConfig) -> BrokerResult<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            config,
            http,
            access_token: None,
            rate_limit: RetryPolicy::rate_limit(),
            server_error: RetryPolicy::server_error(),
        })
    }

    fn trade_version(&self) -> &'static str {
        if self.config.use_trade_v3 {
            "v3"
        } else {
            "v2"
        }
    }

    fn bearer(&self) -> BrokerResult<String> {
        self.access_token
            .as_ref()
            .map(|t| format!("Bearer {t}"))
            .ok_or(BrokerError::NotAuthenticated)
    }

    fn account_key(&self) -> BrokerResult<&str> {
        self.config
            .account_key
            .as_deref()
            .ok_or(BrokerError::NotAuthenticated)
    }

    fn observe(endpoint: &'static str, started: Instant) {
        REQUEST_LATENCY_MS
            .with_label_values(&[endpoint])
            .observe(started.elapsed().as_secs_f64() * 1000.0);
    }

    async fn check(response: reqwest::Response) -> BrokerResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BrokerError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Authenticate with the refresh-token grant.
    ///
    /// Missing credentials are a known startup precondition: this fails
    /// fast with `Ok(false)` and no network call.
    pub async fn authenticate(&mut self) -> BrokerResult<bool> {
        if !self.config.has_credentials() {
            error!("Missing authentication credentials");
            return Ok(false);
        }

        info!(environment = ?self.config.environment, "Authenticating with brokerage");

        let form = [
            ("grant_type", "refresh_token"),
            (
                "refresh_token",
                self.config.refresh_token.as_deref().unwrap_or_default(),
            ),
            (
                "client_id",
                self.config.client_id.as_deref().unwrap_or_default(),
            ),
            (
                "client_secret",
                self.config.client_secret.as_deref().unwrap_or_default(),
            ),
        ];

        let started = Instant::now();
        let builder = self
            .http
            .post(format!("{}/token", self.config.base_url))
            .form(&form);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("token", started);

        let response = Self::check(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("token response: {e}")))?;

        self.access_token = Some(token.access_token);
        info!("Authentication successful");
        Ok(true)
    }

    /// Whether an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Resolve a symbol to its numeric UIC via the reference-data endpoint.
    ///
    /// The keyword search can return near matches, so only an exact symbol
    /// match counts.
    pub async fn find_uic(&self, symbol: &str) -> BrokerResult<Option<u32>> {
        let bearer = self.bearer()?;

        info!(symbol, "Resolving UIC");

        let started = Instant::now();
        let builder = self
            .http
            .get(format!(
                "{}/ref/v1/instruments/details",
                self.config.base_url
            ))
            .query(&[
                ("AssetTypes", "FxSpot"),
                ("Keywords", symbol),
                ("IncludeNonTradable", "false"),
            ])
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("instruments", started);

        let response = Self::check(response).await?;
        let instruments: InstrumentsResponse = response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("instruments response: {e}")))?;

        let uic = instruments
            .data
            .iter()
            .find(|detail| detail.symbol == symbol)
            .map(|detail| detail.identifier);
        if uic.is_none() {
            warn!(symbol, "No matching instrument found");
        }
        Ok(uic)
    }

    /// Resolve a UIC back to its symbol.
    pub async fn find_symbol(&self, uic: u32) -> BrokerResult<Option<String>> {
        let bearer = self.bearer()?;

        let started = Instant::now();
        let builder = self
            .http
            .get(format!(
                "{}/ref/v1/instruments/details/{uic}",
                self.config.base_url
            ))
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("instruments", started);

        let response = Self::check(response).await?;
        let detail: InstrumentDetail = response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("instrument response: {e}")))?;

        Ok(Some(detail.symbol))
    }

    /// Fetch the account's total equity.
    pub async fn get_balance(&self) -> BrokerResult<f64> {
        let bearer = self.bearer()?;
        let account_key = self.account_key()?;

        let started = Instant::now();
        let builder = self
            .http
            .get(format!("{}/port/v1/balances", self.config.base_url))
            .query(&[("AccountKey", account_key)])
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("balances", started);

        let response = Self::check(response).await?;
        let balance: BalanceResponse = response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("balance response: {e}")))?;

        Ok(balance.total_value)
    }
}

impl BrokerApi for BrokerClient {
    async fn get_quote(&self, instrument: &Instrument) -> BrokerResult<Option<Quote>> {
        let bearer = self.bearer()?;

        info!(instrument = %instrument, uic = instrument.uic, "Fetching quote");

        let started = Instant::now();
        let builder = self
            .http
            .get(format!(
                "{}/trade/v1/prices/quotes",
                self.config.base_url
            ))
            .query(&[
                ("AssetType", "FxSpot".to_string()),
                ("Uic", instrument.uic.to_string()),
            ])
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("quote", started);

        let response = Self::check(response).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("quote response: {e}")))?;

        match serde_json::from_value::<QuoteEnvelope>(body) {
            Ok(envelope) => Ok(Some(Quote::new(
                instrument.symbol.clone(),
                envelope.quote.ask,
                envelope.quote.bid,
            ))),
            Err(_) => {
                warn!(instrument = %instrument, "Quote envelope missing from response");
                Ok(None)
            }
        }
    }

    async fn precheck_order(&self, order: &OrderRequest) -> BrokerResult<PrecheckResponse> {
        let bearer = self.bearer()?;
        let body = OrderBody::from_request(self.account_key()?, order);

        info!(
            instrument = %order.instrument,
            side = %order.side,
            amount = %order.amount,
            "Prechecking order"
        );

        let started = Instant::now();
        let builder = self
            .http
            .post(format!(
                "{}/trade/{}/orders/precheck",
                self.config.base_url,
                self.trade_version()
            ))
            .json(&body)
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("precheck", started);

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("precheck response: {e}")))
    }

    async fn accept_disclaimer(&self, disclaimer_id: &str) -> BrokerResult<bool> {
        let bearer = self.bearer()?;

        info!(disclaimer_id, "Accepting disclaimer");

        let started = Instant::now();
        let builder = self
            .http
            .put(format!(
                "{}/trade/v1/disclaimers/{}/accept",
                self.config.base_url, disclaimer_id
            ))
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("disclaimer", started);

        Self::check(response).await?;
        info!(disclaimer_id, "Disclaimer accepted");
        Ok(true)
    }

    async fn place_order(&self, order: &OrderRequest) -> BrokerResult<OrderResponse> {
        let bearer = self.bearer()?;
        let body = OrderBody::from_request(self.account_key()?, order);

        info!(
            instrument = %order.instrument,
            side = %order.side,
            amount = %order.amount,
            "Placing order"
        );

        let started = Instant::now();
        let builder = self
            .http
            .post(format!(
                "{}/trade/{}/orders",
                self.config.base_url,
                self.trade_version()
            ))
            .json(&body)
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("place_order", started);

        let response = Self::check(response).await?;
        let placed: OrderResponse = response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("order response: {e}")))?;

        info!(order_id = %placed.order_id, "Order placed");
        Ok(placed)
    }

    async fn get_order_status(&self, order_id: &str) -> BrokerResult<OrderStatusResponse> {
        let bearer = self.bearer()?;

        let started = Instant::now();
        let builder = self
            .http
            .get(format!(
                "{}/trade/{}/orders/{}",
                self.config.base_url,
                self.trade_version(),
                order_id
            ))
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("order_status", started);

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| BrokerError::MalformedResponse(format!("order status response: {e}")))
    }

    async fn cancel_order(&self, order_id: &str) -> BrokerResult<bool> {
        let bearer = self.bearer()?;

        info!(order_id, "Cancelling order");

        let started = Instant::now();
        let builder = self
            .http
            .delete(format!(
                "{}/trade/{}/orders/{}",
                self.config.base_url,
                self.trade_version(),
                order_id
            ))
            .header("Authorization", &bearer);
        let response = send_with_retry(builder, &self.rate_limit, &self.server_error).await?;
        Self::observe("cancel_order", started);

        Self::check(response).await?;
        info!(order_id, "Order cancelled");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_config(environment: Environment) -> BrokerConfig {
        BrokerConfig {
            environment,
            base_url: environment.base_url().to_string(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            account_key: None,
            timeout: TRADING_TIMEOUT,
            use_trade_v3: false,
        }
    }

    #[test]
    fn test_environment_gateways() {
        assert!(Environment::Sim.base_url().contains("/sim/"));
        assert!(!Environment::Live.base_url().contains("/sim/"));
        assert_eq!(Environment::Sim.env_prefix(), "SIM");
        assert_eq!(Environment::Live.env_prefix(), "LIVE");
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("sim".parse::<Environment>().unwrap(), Environment::Sim);
        assert_eq!("live".parse::<Environment>().unwrap(), Environment::Live);
        assert!("prod".parse::<Environment>().is_err());
    }

    #[test]
    fn test_trade_version_flag() {
        let mut config = bare_config(Environment::Sim);
        let client = BrokerClient::new(config.clone()).unwrap();
        assert_eq!(client.trade_version(), "v2");

        config.use_trade_v3 = true;
        let client = BrokerClient::new(config).unwrap();
        assert_eq!(client.trade_version(), "v3");
    }

    #[tokio::test]
    async fn test_authenticate_fails_fast_without_credentials() {
        let mut client = BrokerClient::new(bare_config(Environment::Sim)).unwrap();
        // No credentials: returns false without touching the network.
        assert!(!client.authenticate().await.unwrap());
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_are_rejected() {
        let client = BrokerClient::new(bare_config(Environment::Sim)).unwrap();
        let result = client.get_quote(&Instrument::new("USDJPY", 42)).await;
        assert!(matches!(result, Err(BrokerError::NotAuthenticated)));
    }
}
