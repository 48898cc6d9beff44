//! Valuation outcomes for a single symbol

use crate::core::error::AssetError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const BINANCE_NETWORK: &str = "Binance Smart Chain";

fn check_symbol(symbol: &str) -> Result<(), AssetError> {
    if symbol.is_empty() {
        return Err(AssetError::EmptySymbol);
    }
    Ok(())
}

fn check_price(symbol: &str, price: f64) -> Result<(), AssetError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AssetError::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CryptoAssetFields")]
pub struct CryptoAsset {
    symbol: String,
    price: f64,
    network: String,
}

impl CryptoAsset {
    pub fn new(symbol: &str, price: f64, network: &str) -> Result<Self, AssetError> {
        check_symbol(symbol)?;
        check_price(symbol, price)?;
        Ok(Self {
            symbol: symbol.to_string(),
            price,
            network: network.to_string(),
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }
}

#[derive(Deserialize)]
struct CryptoAssetFields {
    symbol: String,
    price: f64,
    network: String,
}

impl TryFrom<CryptoAssetFields> for CryptoAsset {
    type Error = AssetError;

    fn try_from(fields: CryptoAssetFields) -> Result<Self, Self::Error> {
        Self::new(&fields.symbol, fields.price, &fields.network)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StockAssetFields")]
pub struct StockAsset {
    symbol: String,
    price: f64,
    exchange: String,
}

impl StockAsset {
    pub fn new(symbol: &str, price: f64, exchange: &str) -> Result<Self, AssetError> {
        check_symbol(symbol)?;
        check_price(symbol, price)?;
        Ok(Self {
            symbol: symbol.to_string(),
            price,
            exchange: exchange.to_string(),
        })
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }
}

#[derive(Deserialize)]
struct StockAssetFields {
    symbol: String,
    price: f64,
    exchange: String,
}

impl TryFrom<StockAssetFields> for StockAsset {
    type Error = AssetError;

    fn try_from(fields: StockAssetFields) -> Result<Self, Self::Error> {
        Self::new(&fields.symbol, fields.price, &fields.exchange)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FiatAssetFields")]
pub struct FiatAsset {
    symbol: String,
    price: f64,
    country: String,
}

impl FiatAsset {
    pub fn new(symbol: &str, price: f64, country: &str) -> Result<Self, AssetError> {
        check_symbol(symbol)?;
        check_price(symbol, price)?;
        Ok(Self {
            symbol: symbol.to_string(),
            price,
            country: country.to_string(),
        })
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

#[derive(Deserialize)]
struct FiatAssetFields {
    symbol: String,
    price: f64,
    country: String,
}

impl TryFrom<FiatAssetFields> for FiatAsset {
    type Error = AssetError;

    fn try_from(fields: FiatAssetFields) -> Result<Self, Self::Error> {
        Self::new(&fields.symbol, fields.price, &fields.country)
    }
}

/// A failed lookup. Never stands in for a genuine zero-priced asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorAssetFields")]
pub struct ErrorAsset {
    symbol: String,
    message: String,
}

impl ErrorAsset {
    pub fn new(symbol: &str, message: &str) -> Result<Self, AssetError> {
        check_symbol(symbol)?;
        if message.trim().is_empty() {
            return Err(AssetError::EmptyMessage(symbol.to_string()));
        }
        Ok(Self {
            symbol: symbol.to_string(),
            message: message.to_string(),
        })
    }

    /// Stand-in for a lookup requested with an empty symbol.
    pub fn empty_symbol() -> Self {
        Self {
            symbol: "<empty>".to_string(),
            message: AssetError::EmptySymbol.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Deserialize)]
struct ErrorAssetFields {
    symbol: String,
    message: String,
}

impl TryFrom<ErrorAssetFields> for ErrorAsset {
    type Error = AssetError;

    fn try_from(fields: ErrorAssetFields) -> Result<Self, Self::Error> {
        Self::new(&fields.symbol, &fields.message)
    }
}

/// The outcome of valuing one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Asset {
    Crypto(CryptoAsset),
    Stock(StockAsset),
    Fiat(FiatAsset),
    Error(ErrorAsset),
}

impl Asset {
    pub fn symbol(&self) -> &str {
        match self {
            Asset::Crypto(c) => &c.symbol,
            Asset::Stock(s) => &s.symbol,
            Asset::Fiat(f) => &f.symbol,
            Asset::Error(e) => &e.symbol,
        }
    }

    /// Market price; always `0.0` for a failed lookup.
    pub fn price(&self) -> f64 {
        match self {
            Asset::Crypto(c) => c.price,
            Asset::Stock(s) => s.price,
            Asset::Fiat(f) => f.price,
            Asset::Error(_) => 0.0,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Asset::Error(_))
    }

    pub fn category(&self) -> &'static str {
        match self {
            Asset::Crypto(_) => "Crypto",
            Asset::Stock(_) => "Stock",
            Asset::Fiat(_) => "Fiat",
            Asset::Error(_) => "Error",
        }
    }

    /// Human readable one-line description of the asset.
    pub fn render(&self) -> String {
        match self {
            Asset::Crypto(c) => format!(
                "Crypto asset: {} - Network: {} - Price: ${}",
                c.symbol, c.network, c.price
            ),
            Asset::Stock(s) => format!(
                "Stock: {} - Exchange: {} - Price: ${}",
                s.symbol, s.exchange, s.price
            ),
            Asset::Fiat(f) => format!(
                "Currency: {} - Country: {} - Price: ${}",
                f.symbol, f.country, f.price
            ),
            Asset::Error(e) => format!(
                "ERROR: could not fetch data for [{}]. Reason: {}",
                e.symbol, e.message
            ),
        }
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl From<CryptoAsset> for Asset {
    fn from(asset: CryptoAsset) -> Self {
        Asset::Crypto(asset)
    }
}

impl From<StockAsset> for Asset {
    fn from(asset: StockAsset) -> Self {
        Asset::Stock(asset)
    }
}

impl From<FiatAsset> for Asset {
    fn from(asset: FiatAsset) -> Self {
        Asset::Fiat(asset)
    }
}

impl From<ErrorAsset> for Asset {
    fn from(asset: ErrorAsset) -> Self {
        Asset::Error(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_rejects_empty_symbol() {
        assert_eq!(
            CryptoAsset::new("", 1.0, BINANCE_NETWORK),
            Err(AssetError::EmptySymbol)
        );
        assert_eq!(StockAsset::new("", 1.0, "NYSE"), Err(AssetError::EmptySymbol));
        assert_eq!(FiatAsset::new("", 1.0, "TR"), Err(AssetError::EmptySymbol));
        assert_eq!(ErrorAsset::new("", "boom"), Err(AssetError::EmptySymbol));
    }

    #[test]
    fn test_construction_rejects_bad_price_and_message() {
        assert!(matches!(
            CryptoAsset::new("BTCUSDT", -1.0, BINANCE_NETWORK),
            Err(AssetError::InvalidPrice { .. })
        ));
        assert!(matches!(
            StockAsset::new("AAPL", f64::NAN, "NASDAQ"),
            Err(AssetError::InvalidPrice { .. })
        ));
        assert_eq!(
            ErrorAsset::new("BAD", "  "),
            Err(AssetError::EmptyMessage("BAD".to_string()))
        );
    }

    #[test]
    fn test_error_asset_price_is_zero() {
        let asset: Asset = ErrorAsset::new("BAD", "Asset not found: BAD").unwrap().into();
        assert_eq!(asset.price(), 0.0);
        assert_eq!(asset.symbol(), "BAD");
        assert!(asset.is_error());
    }

    #[test]
    fn test_render_each_variant() {
        let crypto: Asset = CryptoAsset::new("BTCUSDT", 65000.5, BINANCE_NETWORK)
            .unwrap()
            .into();
        assert_eq!(
            crypto.render(),
            "Crypto asset: BTCUSDT - Network: Binance Smart Chain - Price: $65000.5"
        );

        let stock: Asset = StockAsset::new("AAPL", 190.25, "NASDAQ").unwrap().into();
        assert_eq!(
            stock.render(),
            "Stock: AAPL - Exchange: NASDAQ - Price: $190.25"
        );

        let fiat: Asset = FiatAsset::new("EUR", 1.08, "Germany").unwrap().into();
        assert_eq!(fiat.render(), "Currency: EUR - Country: Germany - Price: $1.08");

        let error: Asset = ErrorAsset::new("FAKEUSDT", "Asset not found: FAKEUSDT")
            .unwrap()
            .into();
        let rendered = error.render();
        assert!(rendered.contains("FAKEUSDT"));
        assert!(rendered.contains("Asset not found: FAKEUSDT"));
        assert!(!rendered.contains('$'));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let asset: Asset = CryptoAsset::new("ETHUSDT", 3200.0, BINANCE_NETWORK)
            .unwrap()
            .into();
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["kind"], "crypto");
        assert_eq!(json["symbol"], "ETHUSDT");
        assert_eq!(json["network"], BINANCE_NETWORK);

        let back: Asset = serde_json::from_value(json).unwrap();
        assert_eq!(back, asset);
    }

    #[test]
    fn test_deserialization_applies_constructor_checks() {
        let negative = serde_json::json!({
            "kind": "crypto", "symbol": "BTCUSDT", "price": -1.0, "network": BINANCE_NETWORK
        });
        let err = serde_json::from_value::<Asset>(negative).unwrap_err();
        assert!(err.to_string().contains("Invalid price -1 for BTCUSDT"));

        let empty_symbol = serde_json::json!({
            "kind": "stock", "symbol": "", "price": 10.0, "exchange": "NASDAQ"
        });
        assert!(serde_json::from_value::<Asset>(empty_symbol).is_err());

        let blank_message = serde_json::json!({
            "kind": "error", "symbol": "BAD", "message": "  "
        });
        assert!(serde_json::from_value::<Asset>(blank_message).is_err());

        let fiat = serde_json::json!({
            "kind": "fiat", "symbol": "EUR", "price": 1.08, "country": "Germany"
        });
        let fiat: Asset = serde_json::from_value(fiat).unwrap();
        assert_eq!(fiat, FiatAsset::new("EUR", 1.08, "Germany").unwrap().into());
    }
}
