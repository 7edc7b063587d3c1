//! Values a set of positions against fresh quotes.
use crate::core::decimal::{self, Money, Scale};
use crate::core::error::EngineResult;
use crate::core::position::InvestmentPosition;
use crate::core::quote::QuoteLookup;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Derived figures for a single position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    /// The position with its price refreshed from the quote, if one arrived.
    pub position: InvestmentPosition,
    pub current_value: Money,
    pub profit_loss: Money,
    pub profit_loss_percent: Decimal,
    pub stale: bool,
}

/// A position valued at its last known price because no fresh quote was
/// available. This is a warning for the caller, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleQuote {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub positions: Vec<PositionValuation>,
    pub total_invested: Money,
    pub current_value: Money,
    pub total_profit_loss: Money,
    pub profit_loss_percent: Decimal,
    pub stale: Vec<StaleQuote>,
}

fn profit_loss_percent(profit_loss: Money, invested: Money, context: &str) -> EngineResult<Decimal> {
    if invested > Decimal::ZERO {
        decimal::percent_of(profit_loss, invested, context)
    } else {
        Ok(Decimal::ZERO)
    }
}

/// Values one position at its current price.
pub fn value_position(position: &InvestmentPosition) -> EngineResult<PositionValuation> {
    let current_value = Scale::Currency.round(decimal::multiply(
        position.current_price,
        position.total_shares,
        "current value",
    )?);
    let profit_loss = current_value - position.total_invested;
    let profit_loss_percent = profit_loss_percent(profit_loss, position.total_invested, "position return")?;

    Ok(PositionValuation {
        position: position.clone(),
        current_value,
        profit_loss,
        profit_loss_percent,
        stale: false,
    })
}

/// Applies each position's quote and aggregates the portfolio.
///
/// A failed or missing quote never aborts the valuation: the position keeps
/// its last known price and is listed in [`PortfolioSummary::stale`].
pub fn valuate(positions: &[InvestmentPosition], quotes: &QuoteLookup) -> EngineResult<PortfolioSummary> {
    let mut valued = Vec::with_capacity(positions.len());
    let mut stale = Vec::new();
    let mut total_invested = Decimal::ZERO;
    let mut current_value = Decimal::ZERO;

    for position in positions {
        let mut refreshed = position.clone();
        let stale_reason = match quotes.get(&position.symbol) {
            Some(Ok(quote)) => {
                refreshed.current_price = Scale::Price.round(quote.price);
                refreshed.price_as_of = Some(quote.as_of);
                None
            }
            Some(Err(e)) => Some(e.to_string()),
            None => Some(format!("No quote requested for {}", position.symbol)),
        };

        let mut valuation = value_position(&refreshed)?;
        if let Some(reason) = stale_reason {
            warn!(symbol = %position.symbol, %reason, "Using stale price");
            valuation.stale = true;
            stale.push(StaleQuote {
                symbol: position.symbol.clone(),
                reason,
            });
        }

        total_invested += valuation.position.total_invested;
        current_value += valuation.current_value;
        valued.push(valuation);
    }

    let total_profit_loss = current_value - total_invested;
    let profit_loss_percent = profit_loss_percent(total_profit_loss, total_invested, "portfolio return")?;

    debug!(
        positions = valued.len(),
        stale = stale.len(),
        %current_value,
        %total_invested,
        "Valued portfolio"
    );

    Ok(PortfolioSummary {
        positions: valued,
        total_invested,
        current_value,
        total_profit_loss,
        profit_loss_percent,
        stale,
    })
}
