//! Pricing abstractions

use crate::core::error::SourceError;
use async_trait::async_trait;

/// An upstream market that quotes a price for a symbol.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self, symbol: &str) -> Result<f64, SourceError>;
}
