//! WebSocket layer — channels, frames, subscriptions, events.
//!
//! This module defines the shared wire/message types; `registry` tracks
//! subscriptions, `router` dispatches inbound frames, and `native` owns the
//! `tokio-tungstenite` transport and connection lifecycle.

pub mod native;
pub mod registry;
pub mod router;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, SubscriptionError};

/// Separator used in outbound channel strings (`"order_book/0"`).
pub const OUTBOUND_CHANNEL_SEP: char = '/';

/// Separator used in inbound channel strings (`"order_book:0"`).
///
/// The asymmetry with [`OUTBOUND_CHANNEL_SEP`] is the venue's observed wire
/// contract, reproduced exactly.
pub const INBOUND_CHANNEL_SEP: char = ':';

// ─── Channels ────────────────────────────────────────────────────────────────

/// The four stream kinds the venue serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    OrderBook,
    Trade,
    AccountAll,
    Ticker,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::OrderBook => "order_book",
            ChannelType::Trade => "trade",
            ChannelType::AccountAll => "account_all",
            ChannelType::Ticker => "ticker",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "order_book" => Ok(ChannelType::OrderBook),
            "trade" => Ok(ChannelType::Trade),
            "account_all" => Ok(ChannelType::AccountAll),
            "ticker" => Ok(ChannelType::Ticker),
            other => Err(SubscriptionError::UnsupportedChannel(other.to_string())),
        }
    }
}

/// One stream identity: the (type, identifier) pair, never a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub channel_type: ChannelType,
    pub identifier: String,
}

impl Channel {
    pub fn new(channel_type: ChannelType, identifier: impl Into<String>) -> Self {
        Self {
            channel_type,
            identifier: identifier.into(),
        }
    }

    /// Outbound wire form, `/`-separated.
    pub fn wire_outbound(&self) -> String {
        format!(
            "{}{}{}",
            self.channel_type, OUTBOUND_CHANNEL_SEP, self.identifier
        )
    }

    /// Parse an inbound `channel` field (`:`-separated) for a known type.
    pub(crate) fn from_inbound(
        channel_type: ChannelType,
        raw: &str,
    ) -> Result<Self, ProtocolError> {
        match raw.split_once(INBOUND_CHANNEL_SEP) {
            Some((_, identifier)) => Ok(Self::new(channel_type, identifier)),
            None => Err(ProtocolError::MalformedChannel(raw.to_string())),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.channel_type, OUTBOUND_CHANNEL_SEP, self.identifier
        )
    }
}

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOut {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    Pong,
}

impl MessageOut {
    pub fn subscribe(channel: &Channel) -> Self {
        MessageOut::Subscribe {
            channel: channel.wire_outbound(),
        }
    }

    pub fn unsubscribe(channel: &Channel) -> Self {
        MessageOut::Unsubscribe {
            channel: channel.wire_outbound(),
        }
    }
}

// ─── Inbound frames ──────────────────────────────────────────────────────────

/// A classified inbound frame.
///
/// The venue tags frames with a `type` string (`"connected"`, `"ping"`,
/// `"subscribed/<channel_type>"`, `"update/<channel_type>"`, …); this enum
/// makes the finite set — and the unknown default — explicit.
#[derive(Debug, Clone)]
pub enum Frame {
    Connected,
    Ping,
    Pong,
    Subscribed {
        channel: Channel,
        payload: serde_json::Value,
    },
    Update {
        channel: Channel,
        payload: serde_json::Value,
    },
    Unknown {
        kind: String,
    },
}

impl Frame {
    /// Classify one raw text frame.
    ///
    /// Non-JSON input, a missing `type`/`channel` field, or a colon-less
    /// channel string is a `ProtocolError`; an unrecognized `type` (including
    /// `subscribed/`/`update/` with a channel type we do not serve) is
    /// `Frame::Unknown`, which the router drops after logging.
    pub fn parse(text: &str) -> Result<Frame, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;

        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(ProtocolError::MissingField("type"))?;

        match kind {
            "connected" => Ok(Frame::Connected),
            "ping" => Ok(Frame::Ping),
            "pong" => Ok(Frame::Pong),
            _ => {
                if let Some(suffix) = kind.strip_prefix("subscribed/") {
                    Self::parse_channel_frame(suffix, &value, true)
                } else if let Some(suffix) = kind.strip_prefix("update/") {
                    Self::parse_channel_frame(suffix, &value, false)
                } else {
                    Ok(Frame::Unknown {
                        kind: kind.to_string(),
                    })
                }
            }
        }
    }

    fn parse_channel_frame(
        type_suffix: &str,
        value: &serde_json::Value,
        is_ack: bool,
    ) -> Result<Frame, ProtocolError> {
        let Ok(channel_type) = ChannelType::from_str(type_suffix) else {
            return Ok(Frame::Unknown {
                kind: value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default()
                    .to_string(),
            });
        };

        let raw_channel = value
            .get("channel")
            .and_then(|c| c.as_str())
            .ok_or(ProtocolError::MissingField("channel"))?;
        let channel = Channel::from_inbound(channel_type, raw_channel)?;

        let payload = value.clone();
        if is_ack {
            Ok(Frame::Subscribed { channel, payload })
        } else {
            Ok(Frame::Update { channel, payload })
        }
    }
}

// ─── Callbacks ───────────────────────────────────────────────────────────────

/// What a dispatched frame represents to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    /// Subscription acknowledgment.
    Subscribed,
    /// Data update.
    Update,
}

impl StreamEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEvent::Subscribed => "subscribed",
            StreamEvent::Update => "update",
        }
    }
}

pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// A registered subscriber callback. Invoked with the event kind and the
/// full frame payload; an `Err` is logged and never interrupts delivery to
/// other callbacks.
pub type ChannelCallback =
    Arc<dyn Fn(StreamEvent, &serde_json::Value) -> Result<(), CallbackError> + Send + Sync>;

// ─── Lifecycle events & config ───────────────────────────────────────────────

/// High-level lifecycle events emitted by the WS client to the consumer.
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// Handshake completed, receive loop running.
    Connected,
    /// Transport lost or closed.
    Disconnected { reason: String },
    /// Reconnection attempt scheduled.
    Reconnecting { attempt: u32, delay: Duration },
    /// All reconnection attempts exhausted; caller must `connect()` again.
    ReconnectFailed { attempts: u32 },
}

/// How tracked subscriptions are replayed onto a fresh connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResubscribePolicy {
    /// One subscribe command per channel; the callback list is truncated to
    /// its first-registered entry. Matches the venue client this SDK
    /// replaces — later callbacks do not survive a reconnect.
    #[default]
    FirstOnly,
}

/// Configuration for the WS client.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// How long `connect()` waits for the `connected` handshake frame.
    pub handshake_timeout: Duration,
    pub max_reconnect_attempts: u32,
    pub initial_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    pub resubscribe_policy: ResubscribePolicy,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::MAINNET_WS_URL.to_string(),
            handshake_timeout: Duration::from_secs(5),
            max_reconnect_attempts: 5,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
            resubscribe_policy: ResubscribePolicy::FirstOnly,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_round_trip() {
        for ct in [
            ChannelType::OrderBook,
            ChannelType::Trade,
            ChannelType::AccountAll,
            ChannelType::Ticker,
        ] {
            assert_eq!(ct.as_str().parse::<ChannelType>().unwrap(), ct);
        }
    }

    #[test]
    fn test_channel_type_rejects_unknown() {
        let err = "depth".parse::<ChannelType>().unwrap_err();
        assert!(matches!(err, SubscriptionError::UnsupportedChannel(s) if s == "depth"));
    }

    #[test]
    fn test_outbound_subscribe_wire_shape() {
        let channel = Channel::new(ChannelType::OrderBook, "0");
        let json = serde_json::to_value(MessageOut::subscribe(&channel)).unwrap();
        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["channel"], "order_book/0");
    }

    #[test]
    fn test_outbound_unsubscribe_wire_shape() {
        let channel = Channel::new(ChannelType::Ticker, "ETH-USDT");
        let json = serde_json::to_value(MessageOut::unsubscribe(&channel)).unwrap();
        assert_eq!(json["type"], "unsubscribe");
        assert_eq!(json["channel"], "ticker/ETH-USDT");
    }

    #[test]
    fn test_outbound_pong_wire_shape() {
        let json = serde_json::to_string(&MessageOut::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_parse_connected_and_keepalives() {
        assert!(matches!(
            Frame::parse(r#"{"type":"connected","session":"abc"}"#).unwrap(),
            Frame::Connected
        ));
        assert!(matches!(
            Frame::parse(r#"{"type":"ping"}"#).unwrap(),
            Frame::Ping
        ));
        assert!(matches!(
            Frame::parse(r#"{"type":"pong"}"#).unwrap(),
            Frame::Pong
        ));
    }

    #[test]
    fn test_parse_subscribed_frame_with_colon_channel() {
        let frame =
            Frame::parse(r#"{"type":"subscribed/order_book","channel":"order_book:7","data":{}}"#)
                .unwrap();
        match frame {
            Frame::Subscribed { channel, payload } => {
                assert_eq!(channel, Channel::new(ChannelType::OrderBook, "7"));
                assert_eq!(payload["channel"], "order_book:7");
            }
            other => panic!("expected Subscribed, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_update_frame() {
        let frame = Frame::parse(
            r#"{"type":"update/trade","channel":"trade:42","data":{"price":"1.5"}}"#,
        )
        .unwrap();
        match frame {
            Frame::Update { channel, payload } => {
                assert_eq!(channel.channel_type, ChannelType::Trade);
                assert_eq!(channel.identifier, "42");
                assert_eq!(payload["data"]["price"], "1.5");
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_type() {
        assert!(matches!(
            Frame::parse(r#"{"type":"heartbeat"}"#).unwrap(),
            Frame::Unknown { kind } if kind == "heartbeat"
        ));
        // Channel-shaped type with an unserved channel type is unknown too.
        assert!(matches!(
            Frame::parse(r#"{"type":"update/depth","channel":"depth:0"}"#).unwrap(),
            Frame::Unknown { kind } if kind == "update/depth"
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(matches!(
            Frame::parse("not json"),
            Err(ProtocolError::MalformedFrame(_))
        ));
        assert!(matches!(
            Frame::parse(r#"{"channel":"order_book:0"}"#),
            Err(ProtocolError::MissingField("type"))
        ));
        assert!(matches!(
            Frame::parse(r#"{"type":"update/order_book"}"#),
            Err(ProtocolError::MissingField("channel"))
        ));
        assert!(matches!(
            Frame::parse(r#"{"type":"update/order_book","channel":"order_book-0"}"#),
            Err(ProtocolError::MalformedChannel(_))
        ));
    }

    #[test]
    fn test_ws_config_defaults() {
        let config = WsConfig::default();
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.initial_reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
        assert_eq!(config.resubscribe_policy, ResubscribePolicy::FirstOnly);
    }
}
