//! Error types shared by the pricing core

use thiserror::Error;

/// Failure reported by a [`crate::core::PriceSource`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("symbol not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Failure while resolving the price of a single symbol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Price source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Symbol must not be empty")]
    EmptySymbol,

    /// Raised through the single-flight cache, shared by every caller that
    /// joined the same computation.
    #[error("{source}")]
    CacheComputationFailed {
        key: String,
        #[source]
        source: Box<PriceError>,
    },
}

impl PriceError {
    /// Strips any cache wrapping and returns the underlying lookup failure.
    pub fn into_cause(self) -> PriceError {
        match self {
            PriceError::CacheComputationFailed { source, .. } => source.into_cause(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            PriceError::AssetNotFound(_) | PriceError::EmptySymbol => true,
            PriceError::SourceUnavailable(_) => false,
            PriceError::CacheComputationFailed { source, .. } => source.is_not_found(),
        }
    }
}

/// Rejected asset construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("Asset symbol must not be empty")]
    EmptySymbol,
    #[error("Invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },
    #[error("Error message for {0} must not be empty")]
    EmptyMessage(String),
}

/// Failure of a whole aggregation call.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No symbols requested")]
    NoSymbols,

    #[error("Price task for {symbol} did not complete: {source}")]
    TaskFailed {
        symbol: String,
        #[source]
        source: tokio::task::JoinError,
    },
}
