//! Client configuration.
//!
//! `LighterConfig` is a plain value constructed once (from the environment or
//! by hand) and passed into [`crate::client::LighterClient`] — there is no
//! process-wide config instance.

use crate::error::ConfigError;
use crate::network::Network;

/// Environment variable names recognized by [`LighterConfig::from_env`].
const ENV_NETWORK: &str = "LIGHTER_NETWORK";
const ENV_ACCOUNT_INDEX: &str = "LIGHTER_ACCOUNT_INDEX";
const ENV_API_KEY_INDEX: &str = "LIGHTER_API_KEY_INDEX";
const ENV_SYMBOL: &str = "LIGHTER_SYMBOL";
const ENV_MAINNET_URL: &str = "LIGHTER_MAINNET_URL";
const ENV_MAINNET_WS_URL: &str = "LIGHTER_MAINNET_WS_URL";
const ENV_TESTNET_URL: &str = "LIGHTER_TESTNET_URL";
const ENV_TESTNET_WS_URL: &str = "LIGHTER_TESTNET_WS_URL";

/// Client configuration for one Lighter deployment.
#[derive(Debug, Clone)]
pub struct LighterConfig {
    pub network: Network,
    /// REST API base URL (defaults to the network's URL).
    pub api_url: String,
    /// WebSocket stream URL (defaults to the network's URL).
    pub ws_url: String,
    /// Account index used for account-channel subscriptions.
    pub account_index: i64,
    /// API key slot on the account.
    pub api_key_index: u8,
    /// Default trading symbol (e.g. `"ETH-USDT"`).
    pub symbol: String,
}

impl LighterConfig {
    /// Build a config for a network with all defaults.
    pub fn new(network: Network, account_index: i64, api_key_index: u8) -> Self {
        Self {
            network,
            api_url: network.api_url().to_string(),
            ws_url: network.ws_url().to_string(),
            account_index,
            api_key_index,
            symbol: "ETH-USDT".to_string(),
        }
    }

    /// Load configuration from the environment (and a `.env` file if present).
    ///
    /// Required: `LIGHTER_NETWORK`, `LIGHTER_ACCOUNT_INDEX`,
    /// `LIGHTER_API_KEY_INDEX`. Optional: `LIGHTER_SYMBOL` and per-network
    /// URL overrides (`LIGHTER_MAINNET_URL`, `LIGHTER_MAINNET_WS_URL`,
    /// `LIGHTER_TESTNET_URL`, `LIGHTER_TESTNET_WS_URL`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let network: Network = require_var(ENV_NETWORK)?.parse()?;
        let account_index = parse_var(ENV_ACCOUNT_INDEX, &require_var(ENV_ACCOUNT_INDEX)?)?;
        let api_key_index = parse_var(ENV_API_KEY_INDEX, &require_var(ENV_API_KEY_INDEX)?)?;

        let (url_var, ws_var) = match network {
            Network::Mainnet => (ENV_MAINNET_URL, ENV_MAINNET_WS_URL),
            Network::Testnet => (ENV_TESTNET_URL, ENV_TESTNET_WS_URL),
        };

        Ok(Self {
            network,
            api_url: std::env::var(url_var).unwrap_or_else(|_| network.api_url().to_string()),
            ws_url: std::env::var(ws_var).unwrap_or_else(|_| network.ws_url().to_string()),
            account_index,
            api_key_index,
            symbol: std::env::var(ENV_SYMBOL).unwrap_or_else(|_| "ETH-USDT".to_string()),
        })
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_url = url.to_string();
        self
    }

    pub fn symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }
}

fn require_var(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(key)),
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidVar {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_network_defaults() {
        let config = LighterConfig::new(Network::Testnet, 7, 2);
        assert_eq!(config.api_url, crate::network::TESTNET_API_URL);
        assert_eq!(config.ws_url, crate::network::TESTNET_WS_URL);
        assert_eq!(config.account_index, 7);
        assert_eq!(config.api_key_index, 2);
        assert_eq!(config.symbol, "ETH-USDT");
    }

    #[test]
    fn test_builder_style_overrides() {
        let config = LighterConfig::new(Network::Mainnet, 0, 0)
            .api_url("https://example.com/")
            .ws_url("wss://example.com/stream")
            .symbol("BTC-USDT");
        assert_eq!(config.api_url, "https://example.com");
        assert_eq!(config.ws_url, "wss://example.com/stream");
        assert_eq!(config.symbol, "BTC-USDT");
    }
}
