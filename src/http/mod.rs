//! HTTP layer: `LighterHttp` client and retry policies.

pub mod client;
pub mod retry;

pub use client::LighterHttp;
pub use retry::{RetryConfig, RetryPolicy};
