//! High-level client — `LighterClient`.
//!
//! Wires the HTTP layer, the precision cache, and the WebSocket client
//! together from one [`LighterConfig`]. Signing is an optional capability
//! injected at construction; the client never resolves a signer itself.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::config::LighterConfig;
use crate::error::{ConfigError, ConnectionError, HttpError, SubscriptionError};
use crate::http::LighterHttp;
use crate::market::{Market, PrecisionCache, RestMarketApi};
use crate::signing::SigningCapability;
use crate::ws::native::WsClient;
use crate::ws::{CallbackError, ChannelType, ResubscribePolicy, StreamEvent, WsConfig, WsEvent};

/// The primary entry point for the Lighter SDK.
///
/// Owns one REST client, one precision cache, and one streaming connection.
/// Construct via [`LighterClient::builder`], [`LighterClient::new`], or
/// [`LighterClient::from_env`].
pub struct LighterClient {
    config: LighterConfig,
    http: LighterHttp,
    precision: Arc<PrecisionCache>,
    ws: WsClient,
    signing: Option<SigningCapability>,
}

impl LighterClient {
    pub fn builder(config: LighterConfig) -> LighterClientBuilder {
        LighterClientBuilder::new(config)
    }

    /// Client with all defaults for the config's network, no signing.
    pub fn new(config: LighterConfig) -> Self {
        Self::builder(config).build()
    }

    /// Client from the environment. Picks up an optional
    /// `LIGHTER_PRIVATE_KEY` as the signing capability.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = LighterConfig::from_env()?;
        let signing = SigningCapability::from_env(config.account_index, config.api_key_index)?;
        Ok(Self::builder(config).signing(signing).build())
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &LighterConfig {
        &self.config
    }

    pub fn http(&self) -> &LighterHttp {
        &self.http
    }

    pub fn precision(&self) -> &Arc<PrecisionCache> {
        &self.precision
    }

    pub fn ws(&self) -> &WsClient {
        &self.ws
    }

    pub fn signing(&self) -> Option<&SigningCapability> {
        self.signing.as_ref()
    }

    /// Whether order signing is available on this client.
    pub fn can_sign(&self) -> bool {
        self.signing.is_some()
    }

    // ── Connection lifecycle ─────────────────────────────────────────────

    /// Open the streaming connection. See [`WsClient::connect`].
    pub async fn connect(&self) -> Result<bool, ConnectionError> {
        self.ws.connect().await
    }

    /// Close the socket but keep subscriptions for a later `connect()`.
    pub async fn disconnect(&self) -> Result<(), ConnectionError> {
        self.ws.disconnect().await
    }

    /// Permanently shut the streaming side down.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        self.ws.close().await
    }

    /// Stream of connection lifecycle events.
    pub fn events(&self) -> impl futures_util::Stream<Item = WsEvent> + Send + '_ {
        self.ws.events()
    }

    // ── Subscriptions ────────────────────────────────────────────────────

    /// Subscribe to order-book updates for a market.
    pub async fn subscribe_order_book<F>(
        &self,
        market_id: u32,
        callback: F,
    ) -> Result<bool, SubscriptionError>
    where
        F: Fn(StreamEvent, &serde_json::Value) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.ws
            .subscribe(
                ChannelType::OrderBook.as_str(),
                &market_id.to_string(),
                callback,
            )
            .await
    }

    /// Subscribe to the trade feed for a market.
    pub async fn subscribe_trades<F>(
        &self,
        market_id: u32,
        callback: F,
    ) -> Result<bool, SubscriptionError>
    where
        F: Fn(StreamEvent, &serde_json::Value) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.ws
            .subscribe(
                ChannelType::Trade.as_str(),
                &market_id.to_string(),
                callback,
            )
            .await
    }

    /// Subscribe to all account updates for the configured account index.
    pub async fn subscribe_account<F>(&self, callback: F) -> Result<bool, SubscriptionError>
    where
        F: Fn(StreamEvent, &serde_json::Value) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.ws
            .subscribe(
                ChannelType::AccountAll.as_str(),
                &self.config.account_index.to_string(),
                callback,
            )
            .await
    }

    /// Subscribe to the ticker for a symbol.
    pub async fn subscribe_ticker<F>(
        &self,
        symbol: &str,
        callback: F,
    ) -> Result<bool, SubscriptionError>
    where
        F: Fn(StreamEvent, &serde_json::Value) -> Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        self.ws
            .subscribe(ChannelType::Ticker.as_str(), symbol, callback)
            .await
    }

    pub async fn subscription_counts(&self) -> HashMap<ChannelType, usize> {
        self.ws.subscription_counts().await
    }

    // ── Market metadata & precision ──────────────────────────────────────

    /// Resolved metadata for a symbol; falls back to defaults when the venue
    /// has no match.
    pub async fn market_info(&self, symbol: &str) -> Market {
        self.precision.market_info(symbol).await
    }

    /// Price formatted onto the market's price grid.
    pub async fn format_price(&self, price: Decimal, symbol: &str) -> String {
        self.precision.format_price(price, symbol).await
    }

    /// Quantity clamped to the market minimum and formatted onto the
    /// quantity grid.
    pub async fn format_quantity(&self, quantity: Decimal, symbol: &str) -> String {
        self.precision.format_quantity(quantity, symbol).await
    }

    /// Price snapped to the market's tick grid.
    pub async fn adjust_to_tick_size(&self, price: Decimal, symbol: &str) -> Decimal {
        self.precision.adjust_to_tick_size(price, symbol).await
    }

    // ── Account ──────────────────────────────────────────────────────────

    /// Raw account snapshot for the configured account index.
    pub async fn account(&self) -> Result<serde_json::Value, HttpError> {
        self.http.account(self.config.account_index).await
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct LighterClientBuilder {
    config: LighterConfig,
    ws_config: WsConfig,
    signing: Option<SigningCapability>,
}

impl LighterClientBuilder {
    pub fn new(config: LighterConfig) -> Self {
        let ws_config = WsConfig {
            url: config.ws_url.clone(),
            ..WsConfig::default()
        };
        Self {
            config,
            ws_config,
            signing: None,
        }
    }

    /// Override the streaming config (timeouts, reconnect attempts).
    pub fn ws_config(mut self, mut ws_config: WsConfig) -> Self {
        // The socket always targets the configured deployment.
        ws_config.url = self.config.ws_url.clone();
        self.ws_config = ws_config;
        self
    }

    pub fn resubscribe_policy(mut self, policy: ResubscribePolicy) -> Self {
        self.ws_config.resubscribe_policy = policy;
        self
    }

    /// Inject the signing capability, if one is available.
    pub fn signing(mut self, signing: Option<SigningCapability>) -> Self {
        self.signing = signing;
        self
    }

    pub fn build(self) -> LighterClient {
        let http = LighterHttp::new(&self.config.api_url);
        let precision = Arc::new(PrecisionCache::new(Arc::new(RestMarketApi::new(
            http.clone(),
        ))));
        let ws = WsClient::new(self.ws_config);
        LighterClient {
            config: self.config,
            http,
            precision,
            ws,
            signing: self.signing,
        }
    }
}
