//! # Lighter SDK
//!
//! Client-side SDK for the Lighter venue: real-time market-data streaming
//! plus market precision metadata and formatting.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Errors, network URLs, configuration, signing capability
//! 2. **HTTP API** — `LighterHttp` with per-endpoint retry policies
//! 3. **Market** — Market metadata, the precision cache, and formatting
//! 4. **WebSocket** — `tokio-tungstenite` client: handshake, subscriptions,
//!    routing, reconnection
//! 5. **High-Level Client** — `LighterClient` wiring the layers together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lighter_sdk::prelude::*;
//!
//! let config = LighterConfig::new(Network::Mainnet, 42, 0);
//! let client = LighterClient::new(config);
//!
//! client.connect().await?;
//! client
//!     .subscribe_order_book(0, |event, payload| {
//!         println!("{}: {payload}", event.as_str());
//!         Ok(())
//!     })
//!     .await?;
//!
//! let price = client.format_price(dec!(2499.987), "ETH-USDT").await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Unified SDK error types.
pub mod error;

/// Network URL constants and the `Network` enum.
pub mod network;

/// Client configuration, plain values only.
pub mod config;

/// Optional order-signing capability.
pub mod signing;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
pub mod http;

// ── Layer 3: Market ──────────────────────────────────────────────────────────

/// Market metadata, precision resolution, and formatting.
pub mod market;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// WebSocket client: channels, frames, subscriptions, events.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `LighterClient` — the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    pub use crate::client::{LighterClient, LighterClientBuilder};
    pub use crate::config::LighterConfig;
    pub use crate::error::{
        ConfigError, ConnectionError, HttpError, PrecisionError, ProtocolError, SdkError,
        SubscriptionError,
    };
    pub use crate::http::retry::{RetryConfig, RetryPolicy};
    pub use crate::market::{Market, MarketApi, MarketType, PrecisionCache};
    pub use crate::network::Network;
    pub use crate::signing::SigningCapability;
    pub use crate::ws::native::{ConnectionState, WsClient};
    pub use crate::ws::{
        Channel, ChannelType, Frame, MessageOut, ResubscribePolicy, StreamEvent, WsConfig, WsEvent,
    };
}
