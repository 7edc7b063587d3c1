use crate::core::cache::Cache;
use crate::core::quote::{Quote, QuoteSource};
use crate::store::MemoryCache;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(300);

/// Serves repeated quote requests from a cache for `ttl`.
///
/// Only successful quotes are cached; a failed fetch is retried on the next
/// request.
pub struct CachingQuoteSource<T: QuoteSource> {
    inner: T,
    cache: Arc<dyn Cache<String, Quote>>,
    ttl: Duration,
}

impl<T: QuoteSource> CachingQuoteSource<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self::with_cache(inner, Arc::new(MemoryCache::<String, Quote>::new()), ttl)
    }

    pub fn with_cache(inner: T, cache: Arc<dyn Cache<String, Quote>>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<T: QuoteSource> QuoteSource for CachingQuoteSource<T> {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let key = symbol.to_uppercase();
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for quote: {}", key);
            return Ok(cached);
        }

        debug!("Cache miss for quote: {}", key);
        let quote = self.inner.fetch_quote(symbol).await?;
        self.cache.put(key, quote.clone(), Some(self.ttl)).await;
        Ok(quote)
    }
}
