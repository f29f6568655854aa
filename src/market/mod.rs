//! Market domain types and precision rules.

pub mod api;
pub mod precision;
pub mod wire;

pub use api::{MarketApi, RestMarketApi};
pub use precision::PrecisionCache;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market::wire::{OrderBookDetails, OrderBookEntry};

/// Spot vs perpetual market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    #[default]
    Perp,
    Spot,
}

impl MarketType {
    /// Quote asset implied by the market type.
    pub fn quote_asset(&self) -> &'static str {
        match self {
            MarketType::Perp => "USD",
            MarketType::Spot => "USDC",
        }
    }
}

/// Resolved metadata for one market: identity, precision grid, and order
/// minimums.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    pub symbol: String,
    pub market_id: u32,
    pub market_type: MarketType,
    pub base_asset: String,
    pub quote_asset: String,
    /// Decimal digits of the price grid.
    pub price_precision: u32,
    /// Decimal digits of the quantity grid.
    pub quantity_precision: u32,
    pub min_quantity: Decimal,
    pub min_notional: Decimal,
    pub taker_fee: Decimal,
    pub maker_fee: Decimal,
    /// True when this market was synthesized from fallback defaults rather
    /// than exchange metadata. Formatting still works, but the grid may not
    /// match the venue's.
    pub is_default: bool,
}

impl Market {
    /// Build from a bulk-listing entry. Native integer precision fields win;
    /// tick/step size strings are the fallback.
    pub(crate) fn from_listing(entry: &OrderBookEntry) -> Self {
        let price_precision = entry
            .supported_price_decimals
            .or_else(|| entry.tick_size.as_deref().map(extract_precision))
            .unwrap_or(2);
        let quantity_precision = entry
            .supported_size_decimals
            .or_else(|| entry.step_size.as_deref().map(extract_precision))
            .unwrap_or(4);

        let market_type = entry.market_type.unwrap_or_default();

        Self {
            symbol: entry.symbol.clone(),
            market_id: entry.market_id,
            market_type,
            base_asset: entry.symbol.clone(),
            quote_asset: market_type.quote_asset().to_string(),
            price_precision,
            quantity_precision,
            min_quantity: entry.min_base_amount.unwrap_or_else(default_min_quantity),
            min_notional: entry.min_quote_amount.unwrap_or_else(default_min_notional),
            taker_fee: entry.taker_fee.unwrap_or_default(),
            maker_fee: entry.maker_fee.unwrap_or_default(),
            is_default: false,
        }
    }

    /// Build from a per-market detail record, where precision only exists as
    /// tick/step size strings.
    pub(crate) fn from_details(details: &OrderBookDetails) -> Self {
        let market_type = details.market_type.unwrap_or_default();
        Self {
            symbol: details.symbol.clone(),
            market_id: details.market_id,
            market_type,
            base_asset: details.symbol.clone(),
            quote_asset: market_type.quote_asset().to_string(),
            price_precision: details
                .tick_size
                .as_deref()
                .map(extract_precision)
                .unwrap_or(2),
            quantity_precision: details
                .step_size
                .as_deref()
                .map(extract_precision)
                .unwrap_or(4),
            min_quantity: details.min_order_size.unwrap_or_else(default_min_quantity),
            min_notional: details
                .min_notional_value
                .unwrap_or_else(default_min_notional),
            taker_fee: details.taker_fee.unwrap_or_default(),
            maker_fee: details.maker_fee.unwrap_or_default(),
            is_default: false,
        }
    }

    /// Fallback market used when metadata lookup fails entirely. A small
    /// table of better-known symbols gets tighter grids; everything else is
    /// (2, 4).
    pub fn fallback(symbol: &str) -> Self {
        let (price_precision, quantity_precision) = match symbol {
            "BTC-USDT" => (2, 6),
            "ETH-USDT" => (2, 4),
            "SOL-USDT" => (3, 2),
            _ => (2, 4),
        };

        let (base, quote) = match symbol.split_once('-') {
            Some((b, q)) => (b.to_string(), q.to_string()),
            None => (symbol.to_string(), "USDT".to_string()),
        };

        Self {
            symbol: symbol.to_string(),
            market_id: 0,
            market_type: MarketType::Perp,
            base_asset: base,
            quote_asset: quote,
            price_precision,
            quantity_precision,
            min_quantity: default_min_quantity(),
            min_notional: default_min_notional(),
            taker_fee: Decimal::ZERO,
            maker_fee: Decimal::ZERO,
            is_default: true,
        }
    }

    /// Symbol without the quote suffix (`"ETH-USDT"` → `"ETH"`).
    pub fn base_symbol(symbol: &str) -> &str {
        symbol.split_once('-').map(|(b, _)| b).unwrap_or(symbol)
    }
}

fn default_min_quantity() -> Decimal {
    // 0.001
    Decimal::new(1, 3)
}

fn default_min_notional() -> Decimal {
    Decimal::from(10)
}

/// Decimal precision implied by a tick/step size string: the number of
/// digits after the decimal point with trailing zeros stripped.
///
/// `"0.0100"` → 2, `"1"` → 0, `"0"` → 0.
pub fn extract_precision(tick_size: &str) -> u32 {
    match tick_size.split_once('.') {
        Some((_, frac)) => frac.trim_end_matches('0').len() as u32,
        None => 0,
    }
}
