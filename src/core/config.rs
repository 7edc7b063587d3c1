use crate::core::decimal::{Money, Price, Rate};
use crate::core::loan::{LoanTerms, PaymentEvent};
use crate::core::net_worth::ManualAsset;
use crate::core::position::TradeEvent;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// A loan in the book: origination terms plus the payments made so far.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoanConfig {
    pub name: String,
    pub kind: Option<String>,
    pub principal: Money,
    pub annual_rate_percent: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub notes: Option<String>,
    #[serde(default)]
    pub payments: Vec<PaymentEvent>,
}

impl LoanConfig {
    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            name: self.name.clone(),
            kind: self.kind.clone(),
            principal: self.principal,
            annual_rate_percent: self.annual_rate_percent,
            term_months: self.term_months,
            start_date: self.start_date,
            notes: self.notes.clone(),
        }
    }
}

/// A position in the book: the trade history plus the last price seen, used
/// when no fresh quote can be fetched.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PositionConfig {
    pub symbol: String,
    pub name: Option<String>,
    pub last_price: Option<Price>,
    #[serde(default)]
    pub trades: Vec<TradeEvent>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSourceKind {
    #[default]
    Yahoo,
    StockService,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StockServiceProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub quote_source: QuoteSourceKind,
    pub yahoo: Option<YahooProviderConfig>,
    pub stock_service: Option<StockServiceProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            quote_source: QuoteSourceKind::Yahoo,
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            stock_service: None,
        }
    }
}

/// Limits applied around every quote fetch.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct QuoteSettings {
    pub timeout_ms: u64,
    pub retries: usize,
    pub failure_threshold: u32,
    pub reset_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        QuoteSettings {
            timeout_ms: 5000,
            retries: 2,
            failure_threshold: 3,
            reset_secs: 30,
            cache_ttl_secs: 300,
        }
    }
}

impl QuoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_schedule_window() -> usize {
    crate::core::amortization::DEFAULT_SCHEDULE_WINDOW
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub loans: Vec<LoanConfig>,
    #[serde(default)]
    pub investments: Vec<PositionConfig>,
    #[serde(default)]
    pub assets: Vec<ManualAsset>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub quotes: QuoteSettings,
    #[serde(default = "default_schedule_window")]
    pub schedule_window: usize,
    pub currency: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "moneyflow", "moneyflow")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("book.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!(
            loans = config.loans.len(),
            investments = config.investments.len(),
            "Successfully loaded config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::net_worth::AssetKind;
    use crate::core::position::TradeSide;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const BOOK: &str = r#"
loans:
  - name: "Home"
    kind: mortgage
    principal: 300000
    annual_rate_percent: 3.5
    term_months: 360
    start_date: 2024-01-15
    payments:
      - date: 2024-02-15
        amount: 1347.13
      - date: 2024-03-15
        amount: 5000
        extra: true
        notes: "bonus"
  - name: "Car"
    principal: "18000.00"
    annual_rate_percent: 6
    term_months: 60
    start_date: 2023-06-01
investments:
  - symbol: "aapl"
    name: "Apple Inc."
    last_price: 185.50
    trades:
      - side: buy
        shares: 10
        price_per_share: 100
        date: 2023-01-10
        fees: 4.95
      - side: sell
        shares: 2.5
        price_per_share: 150.25
        date: 2023-08-01
  - symbol: "MSFT"
assets:
  - name: "Savings"
    kind: cash
    value: 25000
  - name: "Painting"
    value: "1200.50"
    notes: "appraised 2023"
currency: "USD"
"#;

    #[test]
    fn test_config_deserialization() {
        let config: AppConfig = serde_yaml::from_str(BOOK).expect("Failed to deserialize");

        assert_eq!(config.loans.len(), 2);
        let home = &config.loans[0];
        assert_eq!(home.principal, dec!(300000));
        assert_eq!(home.annual_rate_percent, dec!(3.5));
        assert_eq!(home.kind.as_deref(), Some("mortgage"));
        assert_eq!(home.payments.len(), 2);
        assert_eq!(home.payments[0].amount, dec!(1347.13));
        assert!(!home.payments[0].extra);
        assert!(home.payments[1].extra);
        assert_eq!(home.payments[1].notes.as_deref(), Some("bonus"));

        let car = config.loans[1].terms();
        assert_eq!(car.principal, dec!(18000.00));
        assert_eq!(car.start_date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert!(config.loans[1].payments.is_empty());

        assert_eq!(config.investments.len(), 2);
        let aapl = &config.investments[0];
        assert_eq!(aapl.last_price, Some(dec!(185.50)));
        assert_eq!(aapl.trades[0].side, TradeSide::Buy);
        assert_eq!(aapl.trades[0].fees, dec!(4.95));
        assert_eq!(aapl.trades[1].side, TradeSide::Sell);
        assert_eq!(aapl.trades[1].shares, dec!(2.5));
        assert_eq!(aapl.trades[1].fees, dec!(0));
        assert!(config.investments[1].trades.is_empty());
        assert!(config.investments[1].last_price.is_none());

        assert_eq!(config.assets.len(), 2);
        assert_eq!(config.assets[0].kind, AssetKind::Cash);
        assert_eq!(config.assets[0].value, dec!(25000));
        assert_eq!(config.assets[1].kind, AssetKind::Other);
        assert_eq!(config.assets[1].notes.as_deref(), Some("appraised 2023"));

        assert_eq!(config.currency, "USD");
        assert_eq!(config.schedule_window, 12);
        assert_eq!(config.providers.quote_source, QuoteSourceKind::Yahoo);
        assert_eq!(
            config.providers.yahoo.unwrap().base_url,
            "https://query1.finance.yahoo.com"
        );
        assert_eq!(config.quotes.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_provider_and_quote_settings() {
        let yaml_str = r#"
providers:
  quote_source: stock_service
  stock_service:
    base_url: "http://localhost:8080"
quotes:
  timeout_ms: 1500
  failure_threshold: 5
schedule_window: 24
currency: "EUR"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert!(config.loans.is_empty());
        assert!(config.assets.is_empty());
        assert_eq!(config.providers.quote_source, QuoteSourceKind::StockService);
        assert!(config.providers.yahoo.is_none());
        assert_eq!(
            config.providers.stock_service.unwrap().base_url,
            "http://localhost:8080"
        );
        assert_eq!(config.quotes.timeout(), Duration::from_millis(1500));
        assert_eq!(config.quotes.failure_threshold, 5);
        assert_eq!(config.quotes.retries, 2);
        assert_eq!(config.schedule_window, 24);
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(BOOK.as_bytes())?;

        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.loans[0].name, "Home");

        let missing = AppConfig::load_from_path(file.path().with_extension("missing"));
        assert!(missing.unwrap_err().to_string().contains("Failed to read config file"));
        Ok(())
    }

    #[test]
    fn test_invalid_trade_side_is_rejected() {
        let yaml_str = r#"
investments:
  - symbol: "AAPL"
    trades:
      - side: hold
        shares: 1
        price_per_share: 1
        date: 2024-01-01
currency: "USD"
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml_str).is_err());
    }
}
