//! Resolves a single symbol to an [`Asset`], turning lookup failures into data.

use crate::core::asset::{Asset, BINANCE_NETWORK, CryptoAsset, ErrorAsset};
use crate::core::cache::SingleFlightCache;
use crate::core::error::{PriceError, SourceError};
use crate::core::price::PriceSource;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct PriceResolver {
    source: Arc<dyn PriceSource>,
    cache: SingleFlightCache<Asset>,
}

impl PriceResolver {
    pub fn new(source: Arc<dyn PriceSource>, cache: SingleFlightCache<Asset>) -> Self {
        Self { source, cache }
    }

    /// Looks up `symbol`, keeping the not-found vs unavailable distinction.
    pub async fn lookup(&self, symbol: &str) -> Result<Asset, PriceError> {
        if symbol.is_empty() {
            return Err(PriceError::EmptySymbol);
        }
        let source = Arc::clone(&self.source);
        let owned_symbol = symbol.to_string();
        self.cache
            .get_or_compute(symbol, move || async move {
                fetch_and_classify(source.as_ref(), &owned_symbol).await
            })
            .await
            .map_err(PriceError::into_cause)
    }

    /// Resolves `symbol`. Never fails: a failed lookup becomes [`Asset::Error`].
    pub async fn resolve(&self, symbol: &str) -> Asset {
        match self.lookup(symbol).await {
            Ok(asset) => asset,
            Err(e) => {
                warn!("Price lookup failed for {}: {}", symbol, e);
                error_asset(symbol, &e.to_string())
            }
        }
    }

    pub fn cache_snapshot(&self) -> HashMap<String, Asset> {
        self.cache.snapshot()
    }

    pub fn cache(&self) -> &SingleFlightCache<Asset> {
        &self.cache
    }
}

async fn fetch_and_classify(source: &dyn PriceSource, symbol: &str) -> Result<Asset, PriceError> {
    info!("Calling price source for {}", symbol);
    let price = source.fetch_price(symbol).await.map_err(|e| match e {
        SourceError::NotFound(_) => PriceError::AssetNotFound(symbol.to_string()),
        SourceError::Unavailable(detail) => PriceError::SourceUnavailable(detail),
    })?;
    debug!("Price source returned {} for {}", price, symbol);

    CryptoAsset::new(symbol, price, BINANCE_NETWORK)
        .map(Asset::from)
        .map_err(|e| PriceError::SourceUnavailable(e.to_string()))
}

fn error_asset(symbol: &str, message: &str) -> Asset {
    let message = if message.trim().is_empty() {
        "unknown error"
    } else {
        message
    };
    ErrorAsset::new(symbol, message)
        .unwrap_or_else(|_| ErrorAsset::empty_symbol())
        .into()
}
