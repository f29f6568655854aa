//! Network URL constants for the Lighter SDK.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Mainnet REST API base URL.
pub const MAINNET_API_URL: &str = "https://mainnet.zklighter.elliot.ai";

/// Mainnet WebSocket URL.
pub const MAINNET_WS_URL: &str = "wss://mainnet.zklighter.elliot.ai/stream";

/// Testnet REST API base URL.
pub const TESTNET_API_URL: &str = "https://testnet.zklighter.elliot.ai";

/// Testnet WebSocket URL.
pub const TESTNET_WS_URL: &str = "wss://testnet.zklighter.elliot.ai/stream";

/// Which Lighter deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn api_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_API_URL,
            Network::Testnet => TESTNET_API_URL,
        }
    }

    pub fn ws_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_WS_URL,
            Network::Testnet => TESTNET_WS_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}
