//! Price quote abstractions and core types

use crate::core::decimal::Price;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A price observation for one instrument at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Price,
    pub as_of: DateTime<Utc>,
    pub currency: Option<String>,
    pub name: Option<String>,
}

/// Quote results keyed by symbol. A failed or missing entry means the
/// position keeps its last known price.
pub type QuoteLookup = HashMap<String, Result<Quote>>;

/// External price oracle. Implementations report an unavailable quote as an
/// error; they never substitute a made-up price.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;
}

#[async_trait]
impl<T: QuoteSource + ?Sized> QuoteSource for Arc<T> {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        (**self).fetch_quote(symbol).await
    }
}

#[async_trait]
impl<T: QuoteSource + ?Sized> QuoteSource for Box<T> {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        (**self).fetch_quote(symbol).await
    }
}

/// Fetches quotes for all distinct `symbols` concurrently.
pub async fn refresh_quotes(
    source: &dyn QuoteSource,
    symbols: impl IntoIterator<Item = String>,
    on_fetched: &(dyn Fn() + Sync),
) -> QuoteLookup {
    let distinct: BTreeSet<String> = symbols.into_iter().collect();
    debug!(count = distinct.len(), "Refreshing quotes");

    let futures = distinct.into_iter().map(|symbol| async move {
        let result = source.fetch_quote(&symbol).await;
        on_fetched();
        (symbol, result)
    });

    join_all(futures).await.into_iter().collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct MockQuoteSource {
        prices: HashMap<String, Decimal>,
        pub(crate) calls: AtomicUsize,
    }

    impl MockQuoteSource {
        pub(crate) fn new(prices: &[(&str, Decimal)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(s, p)| (s.to_string(), *p))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for MockQuoteSource {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.prices.get(symbol) {
                Some(price) => Ok(Quote {
                    symbol: symbol.to_string(),
                    price: *price,
                    as_of: Utc::now(),
                    currency: Some("USD".to_string()),
                    name: None,
                }),
                None => Err(anyhow!("Quote unavailable for {}", symbol)),
            }
        }
    }

    #[tokio::test]
    async fn test_refresh_quotes_deduplicates() {
        let source = MockQuoteSource::new(&[("AAPL", dec!(150)), ("MSFT", dec!(300))]);
        let fetched = AtomicUsize::new(0);

        let lookup = refresh_quotes(
            &source,
            ["AAPL", "MSFT", "AAPL", "NOPE"].map(String::from),
            &|| {
                fetched.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

        assert_eq!(lookup.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(fetched.load(Ordering::SeqCst), 3);
        assert_eq!(lookup["AAPL"].as_ref().unwrap().price, dec!(150));
        assert!(lookup["NOPE"].is_err());
    }
}
