//! Low-level HTTP client — `LighterHttp`.
//!
//! One method per REST endpoint the SDK consumes. Returns wire types;
//! conversion to domain types happens in the market layer.

use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};
use crate::market::wire::{OrderBookDetailsResponse, OrderBooksResponse};

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Low-level HTTP client for the Lighter REST API.
pub struct LighterHttp {
    base_url: String,
    client: Client,
}

impl LighterHttp {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    // ── Order books ──────────────────────────────────────────────────────

    /// Bulk listing of every order book with its precision metadata.
    pub async fn order_books(&self) -> Result<OrderBooksResponse, HttpError> {
        let url = format!("{}/api/v1/orderBooks", self.base_url);
        self.get(&url, RetryPolicy::Idempotent).await
    }

    /// Detail lookup for a single market.
    pub async fn order_book_details(
        &self,
        market_id: u32,
    ) -> Result<OrderBookDetailsResponse, HttpError> {
        let url = format!(
            "{}/api/v1/orderBookDetails?market_id={}",
            self.base_url, market_id
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Account ──────────────────────────────────────────────────────────

    /// Account snapshot by index. Returned untyped — the SDK only surfaces
    /// it, it does not interpret balances.
    pub async fn account(&self, account_index: i64) -> Result<serde_json::Value, HttpError> {
        let url = format!(
            "{}/api/v1/account?by=index&value={}",
            self.base_url, account_index
        );
        self.get(&url, RetryPolicy::Idempotent).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: &str, retry: RetryPolicy) -> Result<T, HttpError> {
        let config = match retry {
            RetryPolicy::None => return self.do_request(url).await,
            RetryPolicy::Idempotent => RetryConfig::idempotent(),
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T>(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let should_retry = match &e {
                        HttpError::ServerError { status, .. } => {
                            config.retryable_statuses.contains(status)
                        }
                        HttpError::RateLimited { retry_after_ms } => {
                            if let Some(ms) = retry_after_ms {
                                tokio::time::sleep(Duration::from_millis(*ms)).await;
                            }
                            true
                        }
                        HttpError::Timeout => true,
                        HttpError::Reqwest(re) => {
                            re.is_connect() || re.is_timeout() || re.is_request()
                        }
                        _ => false,
                    };

                    if should_retry && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request to {}",
                            url
                        );
                        tokio::time::sleep(delay).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned>(&self, url: &str) -> Result<T, HttpError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();

        if status.is_success() {
            let parsed = resp.json::<T>().await?;
            return Ok(parsed);
        }

        let status_code = status.as_u16();
        let body_text = resp.text().await.unwrap_or_default();

        match status_code {
            401 => Err(HttpError::Unauthorized),
            404 => Err(HttpError::NotFound(body_text)),
            429 => Err(HttpError::RateLimited {
                retry_after_ms: None,
            }),
            400..=499 => Err(HttpError::BadRequest(body_text)),
            _ => Err(HttpError::ServerError {
                status: status_code,
                body: body_text,
            }),
        }
    }
}

impl Clone for LighterHttp {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
        }
    }
}
