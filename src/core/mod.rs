//! Core business logic abstractions

pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod price;
pub mod report;
pub mod resolver;

// Re-export main types for cleaner imports
pub use asset::{Asset, CryptoAsset, ErrorAsset, FiatAsset, StockAsset};
pub use cache::SingleFlightCache;
pub use error::{AssetError, PriceError, ReportError, SourceError};
pub use price::PriceSource;
pub use report::{ReportAggregator, TradeReport};
pub use resolver::PriceResolver;
