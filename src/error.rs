//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    #[error("Precision error: {0}")]
    Precision(#[from] PrecisionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Transport/handshake-level errors on the streaming connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    #[error("Handshake rejected: expected a 'connected' frame, got {0}")]
    HandshakeRejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Client is closed")]
    Closed,

    #[error("Not connected")]
    NotConnected,
}

/// Malformed or unparseable inbound frames.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Frame is missing the '{0}' field")]
    MissingField(&'static str),

    #[error("Malformed channel string: {0:?}")]
    MalformedChannel(String),
}

/// Errors raised by the subscription API surface.
#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("Unsupported channel type: {0:?}")]
    UnsupportedChannel(String),
}

/// Strict precision-lookup failures.
///
/// The default lookup path absorbs these into fallback markets; only the
/// `*_strict` variants surface them.
#[derive(Error, Debug)]
pub enum PrecisionError {
    #[error("No market found for symbol {0:?}")]
    UnknownSymbol(String),

    #[error("Market metadata lookup failed: {0}")]
    Lookup(String),
}

/// Configuration loading/validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidVar { key: &'static str, value: String },

    #[error("Unknown network {0:?} (expected mainnet or testnet)")]
    UnknownNetwork(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}
