//! Investment positions and trade events.

use crate::core::decimal::{Money, Price, Scale, Shares};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentPosition {
    pub symbol: String,
    pub name: Option<String>,
    pub total_shares: Shares,
    pub average_cost: Price,
    pub total_invested: Money,
    pub current_price: Price,
    pub price_as_of: Option<DateTime<Utc>>,
}

impl InvestmentPosition {
    /// An empty position priced at the last known quote.
    pub fn open(symbol: &str, current_price: Price) -> Self {
        InvestmentPosition {
            symbol: normalize_symbol(symbol),
            name: None,
            total_shares: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            current_price: Scale::Price.round(current_price),
            price_as_of: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.total_shares.is_zero()
    }

    /// Only a position without holdings may be removed.
    pub fn can_close(&self) -> bool {
        self.is_empty()
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TradeSide::Buy => "BUY",
                TradeSide::Sell => "SELL",
            }
        )
    }
}

impl FromStr for TradeSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TradeSide::Buy),
            "SELL" => Ok(TradeSide::Sell),
            _ => Err(anyhow::anyhow!("Invalid trade side: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub side: TradeSide,
    pub shares: Shares,
    pub price_per_share: Price,
    pub date: NaiveDate,
    #[serde(default)]
    pub fees: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The transaction row a caller persists for an applied trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub symbol: String,
    pub side: TradeSide,
    pub shares: Shares,
    pub price_per_share: Price,
    pub total_amount: Money,
    pub fees: Money,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub position: InvestmentPosition,
    pub record: TransactionRecord,
}
