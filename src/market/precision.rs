//! Precision-resolution cache.
//!
//! Maps symbols to [`Market`] metadata and derives deterministic
//! price/quantity formatting from the exchange's decimal grids. Lookup
//! failures degrade to fallback defaults rather than erroring — callers that
//! need strict resolution use [`PrecisionCache::market_info_strict`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_lock::RwLock;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{HttpError, PrecisionError};
use crate::market::api::MarketApi;
use crate::market::Market;

/// A cached market plus when it was resolved.
#[derive(Debug, Clone)]
pub struct PrecisionCacheEntry {
    pub market: Market,
    pub cached_at: Instant,
}

/// Symbol → market metadata cache with formatting helpers.
///
/// Two indices are kept: `symbol → market_id` and `market_id → entry`. They
/// are only ever written while both write guards are held, so readers never
/// observe one updated without the other. The cache is unbounded and cleared
/// only by [`refresh_cache`](Self::refresh_cache).
pub struct PrecisionCache {
    api: Arc<dyn MarketApi>,
    symbol_index: RwLock<HashMap<String, u32>>,
    markets: RwLock<HashMap<u32, PrecisionCacheEntry>>,
}

impl PrecisionCache {
    pub fn new(api: Arc<dyn MarketApi>) -> Self {
        Self {
            api,
            symbol_index: RwLock::new(HashMap::new()),
            markets: RwLock::new(HashMap::new()),
        }
    }

    // ── Lookup ───────────────────────────────────────────────────────────

    /// Resolve a symbol to market metadata, consulting the cache first.
    ///
    /// Never fails: on collaborator error or no match the returned market is
    /// [`Market::fallback`] with `is_default` set, and a warning is logged.
    /// Only successful lookups are cached.
    pub async fn market_info(&self, symbol: &str) -> Market {
        if let Some(market) = self.cached(symbol).await {
            return market;
        }

        match self.lookup(symbol).await {
            Ok(Some(market)) => {
                tracing::info!(symbol, market_id = market.market_id, "resolved market metadata");
                self.store(symbol, market.clone()).await;
                market
            }
            Ok(None) => {
                tracing::warn!(symbol, "no market found in listing, using fallback precision");
                Market::fallback(symbol)
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "market metadata lookup failed, using fallback precision");
                Market::fallback(symbol)
            }
        }
    }

    /// Like [`market_info`](Self::market_info) but surfaces failures instead
    /// of degrading to defaults.
    pub async fn market_info_strict(&self, symbol: &str) -> Result<Market, PrecisionError> {
        if let Some(market) = self.cached(symbol).await {
            return Ok(market);
        }

        match self.lookup(symbol).await {
            Ok(Some(market)) => {
                self.store(symbol, market.clone()).await;
                Ok(market)
            }
            Ok(None) => Err(PrecisionError::UnknownSymbol(symbol.to_string())),
            Err(e) => Err(PrecisionError::Lookup(e.to_string())),
        }
    }

    async fn cached(&self, symbol: &str) -> Option<Market> {
        let index = self.symbol_index.read().await;
        let market_id = *index.get(symbol)?;
        let markets = self.markets.read().await;
        markets.get(&market_id).map(|entry| entry.market.clone())
    }

    /// Scan the bulk listing for an exact match, then a base-symbol match
    /// (`"ETH-USDT"` → `"ETH"`). If the row resolves the id but is missing
    /// grid metadata, fall through to the per-market detail endpoint.
    async fn lookup(&self, symbol: &str) -> Result<Option<Market>, HttpError> {
        let listing = self.api.list_markets().await?;

        let base = Market::base_symbol(symbol);
        let entry = listing
            .iter()
            .find(|e| e.symbol == symbol)
            .or_else(|| listing.iter().find(|e| e.symbol == base));

        let Some(entry) = entry else {
            return Ok(None);
        };

        if entry.has_precision_metadata() {
            return Ok(Some(Market::from_listing(entry)));
        }

        match self.api.market_detail(entry.market_id).await? {
            Some(details) => Ok(Some(Market::from_details(&details))),
            None => Ok(Some(Market::from_listing(entry))),
        }
    }

    /// Write both indices under simultaneously-held guards.
    async fn store(&self, symbol: &str, market: Market) {
        let mut index = self.symbol_index.write().await;
        let mut markets = self.markets.write().await;
        index.insert(symbol.to_string(), market.market_id);
        markets.insert(
            market.market_id,
            PrecisionCacheEntry {
                market,
                cached_at: Instant::now(),
            },
        );
    }

    // ── Formatting ───────────────────────────────────────────────────────

    /// Round a price to the market's price grid and render it without
    /// trailing zeros or a dangling decimal point.
    pub async fn format_price(&self, price: Decimal, symbol: &str) -> String {
        let market = self.market_info(symbol).await;
        format_to_precision(price, market.price_precision)
    }

    /// Round a quantity to the market's quantity grid. Values below
    /// `min_quantity` are raised to the minimum, never rejected.
    pub async fn format_quantity(&self, quantity: Decimal, symbol: &str) -> String {
        let market = self.market_info(symbol).await;
        let quantity = quantity.max(market.min_quantity);
        format_to_precision(quantity, market.quantity_precision)
    }

    /// Round a price to the nearest multiple of `10^-price_precision`.
    /// Idempotent: adjusting an already-adjusted price is a no-op.
    pub async fn adjust_to_tick_size(&self, price: Decimal, symbol: &str) -> Decimal {
        let market = self.market_info(symbol).await;
        price.round_dp_with_strategy(
            market.price_precision,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }

    // ── Maintenance ──────────────────────────────────────────────────────

    /// Drop both indices and repopulate from a fresh bulk listing. Markets
    /// absent from the new listing disappear; there is no partial merge. On
    /// fetch failure the existing cache is left untouched.
    pub async fn refresh_cache(&self) -> Result<usize, HttpError> {
        let listing = self.api.list_markets().await?;

        let now = Instant::now();
        let mut new_index = HashMap::with_capacity(listing.len());
        let mut new_markets = HashMap::with_capacity(listing.len());
        for entry in &listing {
            let market = Market::from_listing(entry);
            new_index.insert(market.symbol.clone(), market.market_id);
            new_markets.insert(
                market.market_id,
                PrecisionCacheEntry {
                    market,
                    cached_at: now,
                },
            );
        }

        let count = new_markets.len();
        let mut index = self.symbol_index.write().await;
        let mut markets = self.markets.write().await;
        *index = new_index;
        *markets = new_markets;

        tracing::info!(markets = count, "precision cache refreshed");
        Ok(count)
    }

    /// Number of cached markets.
    pub async fn len(&self) -> usize {
        self.markets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.markets.read().await.is_empty()
    }
}

fn format_to_precision(value: Decimal, precision: u32) -> String {
    value
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}
