//! Order-signing capability.
//!
//! Signing itself lives outside this crate. The SDK only needs to know
//! whether a signer is available, so the composition root resolves one and
//! injects it as `Option<SigningCapability>` at construction time — the SDK
//! never goes looking for signer libraries on its own.

use crate::error::ConfigError;

/// Length of a signer-format private key in hex characters (20 bytes).
const SIGNER_KEY_LEN: usize = 40;

/// Credentials for the external signer component.
#[derive(Clone)]
pub struct SigningCapability {
    account_index: i64,
    api_key_index: u8,
    private_key: String,
}

impl SigningCapability {
    /// Validate and normalize a private key into the signer's 40-hex-char
    /// format: strips a `0x` prefix, checks hex, and truncates longer
    /// standard-ECDSA keys down to the signer length.
    pub fn new(
        account_index: i64,
        api_key_index: u8,
        private_key: &str,
    ) -> Result<Self, ConfigError> {
        let key = private_key.strip_prefix("0x").unwrap_or(private_key);

        if key.len() < SIGNER_KEY_LEN {
            return Err(ConfigError::InvalidPrivateKey(format!(
                "key is {} chars, need at least {}",
                key.len(),
                SIGNER_KEY_LEN
            )));
        }
        if !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidPrivateKey(
                "key contains non-hex characters".to_string(),
            ));
        }

        let key = if key.len() > SIGNER_KEY_LEN {
            tracing::warn!(
                len = key.len(),
                "private key longer than signer format, truncating to {} chars",
                SIGNER_KEY_LEN
            );
            &key[..SIGNER_KEY_LEN]
        } else {
            key
        };

        Ok(Self {
            account_index,
            api_key_index,
            private_key: key.to_string(),
        })
    }

    /// Load from `LIGHTER_PRIVATE_KEY` plus the given indices. Returns
    /// `Ok(None)` when the variable is unset (signing simply unavailable).
    pub fn from_env(account_index: i64, api_key_index: u8) -> Result<Option<Self>, ConfigError> {
        match std::env::var("LIGHTER_PRIVATE_KEY") {
            Ok(key) if !key.is_empty() => {
                Self::new(account_index, api_key_index, &key).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn account_index(&self) -> i64 {
        self.account_index
    }

    pub fn api_key_index(&self) -> u8 {
        self.api_key_index
    }

    pub(crate) fn private_key(&self) -> &str {
        &self.private_key
    }
}

// Keep the key out of debug output.
impl std::fmt::Debug for SigningCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCapability")
            .field("account_index", &self.account_index)
            .field("api_key_index", &self.api_key_index)
            .field(
                "private_key",
                &format!("{}…{}", &self.private_key[..4], &self.private_key[36..]),
            )
            .finish()
    }
}
