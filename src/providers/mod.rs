pub mod caching;
pub mod guarded;
pub mod stock_service;
pub mod util;
pub mod yahoo_finance;

pub use caching::CachingQuoteSource;
pub use guarded::{CircuitBreaker, GuardedQuoteSource};
pub use stock_service::StockServiceProvider;
pub use yahoo_finance::YahooFinanceProvider;

use crate::core::config::{AppConfig, QuoteSettings, QuoteSourceKind};
use crate::core::quote::QuoteSource;
use anyhow::{Context, Result};
use tracing::debug;

/// Builds the configured quote source behind a circuit breaker with a
/// per-request timeout, with a TTL cache in front. Cached quotes are still
/// served while the circuit is open.
pub fn build_quote_source(config: &AppConfig) -> Result<Box<dyn QuoteSource>> {
    let settings = &config.quotes;
    let provider: Box<dyn QuoteSource> = match config.providers.quote_source {
        QuoteSourceKind::Yahoo => {
            let base_url = config
                .providers
                .yahoo
                .as_ref()
                .map_or(yahoo_finance::DEFAULT_BASE_URL, |p| &p.base_url);
            debug!(base_url, "Using Yahoo Finance quotes");
            Box::new(YahooFinanceProvider::new(base_url, settings.retries)?)
        }
        QuoteSourceKind::StockService => {
            let base_url = config
                .providers
                .stock_service
                .as_ref()
                .map(|p| p.base_url.as_str())
                .context("providers.stock_service.base_url is required for the stock_service quote source")?;
            debug!(base_url, "Using stock service quotes");
            Box::new(StockServiceProvider::new(base_url, settings.retries)?)
        }
    };

    Ok(Box::new(layered(provider, settings)))
}

fn layered<T: QuoteSource>(provider: T, settings: &QuoteSettings) -> CachingQuoteSource<GuardedQuoteSource<T>> {
    let guarded = GuardedQuoteSource::new(
        provider,
        CircuitBreaker::new(settings.failure_threshold, settings.reset_timeout()),
        settings.timeout(),
    );
    CachingQuoteSource::new(guarded, settings.cache_ttl())
}
