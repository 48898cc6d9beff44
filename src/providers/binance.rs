use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::config::BinanceProviderConfig;
use crate::core::error::SourceError;
use crate::core::price::PriceSource;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com/api/v3";

/// Spot ticker prices from the Binance REST API.
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("tradeflow/1.0")
            .timeout(timeout)
            .build()?;
        Ok(BinanceClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &BinanceProviderConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.base_url, config.timeout())
    }
}

#[derive(Deserialize, Debug)]
struct TickerPriceResponse {
    symbol: String,
    price: String,
}

fn parse_price(symbol: &str, raw: &str) -> Result<f64, SourceError> {
    let price: f64 = raw.trim().parse().map_err(|e| {
        SourceError::Unavailable(format!("Malformed price '{raw}' for {symbol}: {e}"))
    })?;
    if !price.is_finite() || price < 0.0 {
        return Err(SourceError::Unavailable(format!(
            "Invalid price {price} for {symbol}"
        )));
    }
    Ok(price)
}

#[async_trait]
impl PriceSource for BinanceClient {
    #[instrument(
        name = "BinancePriceFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_price(&self, symbol: &str) -> Result<f64, SourceError> {
        let url = format!("{}/ticker/price", self.base_url);
        debug!("Requesting ticker price from {}", url);

        let request = self.client.get(&url).query(&[("symbol", symbol)]);
        let response = request.send().await.map_err(|e| {
            SourceError::Unavailable(format!("Request error: {e} for symbol: {symbol}"))
        })?;

        let status = response.status();
        debug!(%status, "Received Binance response");
        if status.is_client_error() {
            return Err(SourceError::NotFound(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "HTTP error: {status} for symbol: {symbol}"
            )));
        }

        let text = response.text().await.map_err(|e| {
            SourceError::Unavailable(format!("Failed to read response for {symbol}: {e}"))
        })?;
        let ticker: TickerPriceResponse = serde_json::from_str(&text).map_err(|e| {
            SourceError::Unavailable(format!("Failed to parse JSON response for {symbol}: {e}"))
        })?;
        if ticker.symbol != symbol {
            debug!("Ticker echoed {} for requested {}", ticker.symbol, symbol);
        }

        parse_price(symbol, &ticker.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(
        symbol: &str,
        status_code: u16,
        mock_response: &str,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ticker/price"))
            .and(query_param("symbol", symbol))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn client(mock_server: &MockServer) -> BinanceClient {
        BinanceClient::new(&mock_server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_price_fetch() {
        let mock_server =
            create_mock_server("BTCUSDT", 200, r#"{"symbol":"BTCUSDT","price":"65000.50000000"}"#)
                .await;

        let price = client(&mock_server).fetch_price("BTCUSDT").await.unwrap();
        assert_eq!(price, 65000.5);
    }

    #[tokio::test]
    async fn test_symbol_is_encoded_as_one_query_value() {
        let symbol = "BTC USDT&symbol=ETHUSDT";
        let mock_server =
            create_mock_server(symbol, 200, r#"{"symbol":"BTCUSDT","price":"1.25"}"#).await;

        let price = client(&mock_server).fetch_price(symbol).await.unwrap();
        assert_eq!(price, 1.25);
    }

    #[tokio::test]
    async fn test_client_error_is_not_found() {
        let mock_server = create_mock_server(
            "FAKEUSDT",
            400,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        )
        .await;

        let result = client(&mock_server).fetch_price("FAKEUSDT").await;
        assert_eq!(result, Err(SourceError::NotFound("FAKEUSDT".to_string())));
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mock_server = create_mock_server("BTCUSDT", 503, "").await;

        let result = client(&mock_server).fetch_price("BTCUSDT").await;
        assert_eq!(
            result,
            Err(SourceError::Unavailable(
                "HTTP error: 503 Service Unavailable for symbol: BTCUSDT".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_unavailable() {
        let mock_server =
            create_mock_server("BTCUSDT", 200, r#"{"symbol":"BTCUSDT","last":"1.0"}"#).await;

        let result = client(&mock_server).fetch_price("BTCUSDT").await;
        match result {
            Err(SourceError::Unavailable(detail)) => {
                assert!(detail.contains("Failed to parse JSON response for BTCUSDT"))
            }
            other => panic!("Expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_numeric_price_is_unavailable() {
        let mock_server =
            create_mock_server("BTCUSDT", 200, r#"{"symbol":"BTCUSDT","price":"n/a"}"#).await;

        let result = client(&mock_server).fetch_price("BTCUSDT").await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_unreachable_source_is_unavailable() {
        // Nothing listens on port 9 locally.
        let client = BinanceClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let result = client.fetch_price("BTCUSDT").await;
        match result {
            Err(SourceError::Unavailable(detail)) => assert!(detail.contains("Request error")),
            other => panic!("Expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_price_rejects_negative() {
        assert!(parse_price("X", "-1").is_err());
        assert_eq!(parse_price("X", " 2.5 "), Ok(2.5));
    }
}
