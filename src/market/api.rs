//! The market-metadata collaborator seam.
//!
//! `PrecisionCache` talks to the venue through this trait so tests (and
//! alternative transports) can stand in for the REST API.

use async_trait::async_trait;

use crate::error::HttpError;
use crate::http::LighterHttp;
use crate::market::wire::{OrderBookDetails, OrderBookEntry};

/// Read-only access to exchange market metadata.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Full market listing with precision metadata.
    async fn list_markets(&self) -> Result<Vec<OrderBookEntry>, HttpError>;

    /// Detail record for one market. `Ok(None)` when the venue has no such
    /// market.
    async fn market_detail(&self, market_id: u32) -> Result<Option<OrderBookDetails>, HttpError>;
}

/// REST-backed implementation over [`LighterHttp`].
#[derive(Clone)]
pub struct RestMarketApi {
    http: LighterHttp,
}

impl RestMarketApi {
    pub fn new(http: LighterHttp) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MarketApi for RestMarketApi {
    async fn list_markets(&self) -> Result<Vec<OrderBookEntry>, HttpError> {
        Ok(self.http.order_books().await?.order_books)
    }

    async fn market_detail(&self, market_id: u32) -> Result<Option<OrderBookDetails>, HttpError> {
        let resp = self.http.order_book_details(market_id).await?;
        Ok(resp.order_book_details.into_iter().next())
    }
}
