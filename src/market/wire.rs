//! Wire types for the order-book metadata endpoints (REST).
//!
//! Decimal amounts arrive as JSON strings; precision sometimes as native
//! integers (`supported_*_decimals`), sometimes only as tick/step size
//! strings. Both shapes are kept optional here and reconciled in
//! [`crate::market::Market`].

use crate::market::MarketType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response for the bulk order-book listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderBooksResponse {
    pub order_books: Vec<OrderBookEntry>,
}

/// One market in the bulk listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderBookEntry {
    pub symbol: String,
    pub market_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_type: Option<MarketType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_price_decimals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_size_decimals: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_size: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_base_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quote_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_fee: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maker_fee: Option<Decimal>,
}

impl OrderBookEntry {
    /// Whether the bulk row carries enough metadata to derive both grids.
    pub(crate) fn has_precision_metadata(&self) -> bool {
        (self.supported_price_decimals.is_some() || self.tick_size.is_some())
            && (self.supported_size_decimals.is_some() || self.step_size.is_some())
    }
}

/// Response for the per-market detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderBookDetailsResponse {
    pub order_book_details: Vec<OrderBookDetails>,
}

/// Detail record for a single market.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderBookDetails {
    pub symbol: String,
    pub market_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_type: Option<MarketType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_size: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_size: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_notional_value: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taker_fee: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maker_fee: Option<Decimal>,
}
