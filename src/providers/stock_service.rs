use super::util::{USER_AGENT, decimal_from_f64, with_retry};
use crate::core::quote::{Quote, QuoteSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

/// Quote source backed by a stock quote service exposing
/// `GET /api/stocks/{SYMBOL}`.
pub struct StockServiceProvider {
    base_url: String,
    client: reqwest::Client,
    retries: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockQuoteResponse {
    symbol: String,
    price: f64,
    currency: Option<String>,
    name: Option<String>,
    last_updated: Option<String>,
}

/// Reads an RFC 3339 timestamp, or a naive ISO timestamp taken as UTC.
fn parse_last_updated(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            warn!(value, error = %e, "Ignoring unparseable quote timestamp");
            None
        }
    }
}

impl StockServiceProvider {
    pub fn new(base_url: &str, retries: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retries,
        })
    }
}

#[async_trait]
impl QuoteSource for StockServiceProvider {
    #[instrument(name = "StockServiceFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = symbol.to_uppercase();
        let url = format!("{}/api/stocks/{}", self.base_url, symbol);
        debug!("Requesting quote from {}", url);

        let response = with_retry(|| self.client.get(&url).send(), self.retries, 500)
            .await
            .context("Quote request failed")?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(anyhow!("Stock not found: {}", symbol)),
            status if !status.is_success() => {
                return Err(anyhow!("HTTP error: {} for symbol: {}", status, symbol));
            }
            _ => {}
        }

        let response_text = response
            .text()
            .await
            .context("Failed to get response text")?;

        let data: StockQuoteResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse quote response"
                );
                return Err(anyhow!("Failed to parse quote response for {}: {}", symbol, e));
            }
        };

        if data.price <= 0.0 {
            return Err(anyhow!("Invalid price {} for symbol: {}", data.price, symbol));
        }

        Ok(Quote {
            symbol: data.symbol,
            price: decimal_from_f64(data.price)?,
            as_of: data
                .last_updated
                .as_deref()
                .and_then(parse_last_updated)
                .unwrap_or_else(Utc::now),
            currency: data.currency,
            name: data.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(symbol: &str, template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/api/stocks/{symbol}")))
            .respond_with(template)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_fetch_quote() {
        let body = r#"{
            "symbol": "MSFT",
            "price": 415.5,
            "currency": "USD",
            "name": "Microsoft Corporation",
            "lastUpdated": "2024-06-03T20:00:00Z"
        }"#;
        let mock_server =
            create_mock_server("MSFT", ResponseTemplate::new(200).set_body_string(body)).await;
        let provider = StockServiceProvider::new(&mock_server.uri(), 0).unwrap();

        let quote = provider.fetch_quote("msft").await.unwrap();
        assert_eq!(quote.symbol, "MSFT");
        assert_eq!(quote.price, dec!(415.5));
        assert_eq!(quote.as_of, Utc.with_ymd_and_hms(2024, 6, 3, 20, 0, 0).unwrap());
        assert_eq!(quote.name.as_deref(), Some("Microsoft Corporation"));
    }

    #[tokio::test]
    async fn test_fetch_quote_with_naive_timestamp() {
        let body = r#"{"symbol": "AAPL", "price": 189.25, "currency": "USD", "name": "Apple Inc.", "lastUpdated": "2024-06-03T20:00:00.123456"}"#;
        let mock_server =
            create_mock_server("AAPL", ResponseTemplate::new(200).set_body_string(body)).await;
        let provider = StockServiceProvider::new(&mock_server.uri(), 0).unwrap();

        let quote = provider.fetch_quote("AAPL").await.unwrap();
        assert_eq!(quote.price, dec!(189.25));
        assert_eq!(
            quote.as_of,
            Utc.with_ymd_and_hms(2024, 6, 3, 20, 0, 0).unwrap() + chrono::Duration::microseconds(123456)
        );
    }

    #[tokio::test]
    async fn test_unparseable_timestamp_is_ignored() {
        let body = r#"{"symbol": "AAPL", "price": 189.25, "lastUpdated": "yesterday"}"#;
        let mock_server =
            create_mock_server("AAPL", ResponseTemplate::new(200).set_body_string(body)).await;
        let provider = StockServiceProvider::new(&mock_server.uri(), 0).unwrap();

        let before = Utc::now();
        let quote = provider.fetch_quote("AAPL").await.unwrap();
        assert_eq!(quote.price, dec!(189.25));
        assert!(quote.as_of >= before);
    }

    #[test]
    fn test_parse_last_updated() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 3, 20, 0, 0).unwrap();
        assert_eq!(parse_last_updated("2024-06-03T20:00:00Z"), Some(expected));
        assert_eq!(parse_last_updated("2024-06-03T22:00:00+02:00"), Some(expected));
        assert_eq!(parse_last_updated("2024-06-03T20:00:00"), Some(expected));
        assert_eq!(parse_last_updated("not a date"), None);
    }

    #[tokio::test]
    async fn test_not_found() {
        let mock_server = create_mock_server("ZZZZ", ResponseTemplate::new(404)).await;
        let provider = StockServiceProvider::new(&mock_server.uri(), 0).unwrap();

        let err = provider.fetch_quote("ZZZZ").await.unwrap_err();
        assert_eq!(err.to_string(), "Stock not found: ZZZZ");
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = create_mock_server("AAPL", ResponseTemplate::new(503)).await;
        let provider = StockServiceProvider::new(&mock_server.uri(), 0).unwrap();

        let err = provider.fetch_quote("AAPL").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP error: 503 Service Unavailable for symbol: AAPL"
        );
    }

    #[tokio::test]
    async fn test_rejects_non_positive_price() {
        let body = r#"{"symbol": "AAPL", "price": 0}"#;
        let mock_server =
            create_mock_server("AAPL", ResponseTemplate::new(200).set_body_string(body)).await;
        let provider = StockServiceProvider::new(&mock_server.uri(), 0).unwrap();

        let err = provider.fetch_quote("AAPL").await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid price"));
    }
}
