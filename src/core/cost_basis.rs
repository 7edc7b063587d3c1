//! Weighted-average cost basis for investment positions.
//!
//! Sells reduce the invested total at the current average cost and leave the
//! average itself unchanged. No realized gain or loss is computed for a sale;
//! only the remaining position's basis is tracked. Fees are added to the basis
//! on buys and have no effect on the basis of sells.

use crate::core::decimal::{self, Scale};
use crate::core::error::{EngineError, EngineResult};
use crate::core::position::{InvestmentPosition, TradeEvent, TradeResult, TradeSide, TransactionRecord};
use rust_decimal::Decimal;
use tracing::debug;

/// Trade values rounded to their declared scales.
struct NormalizedTrade {
    shares: Decimal,
    price: Decimal,
    fees: Decimal,
}

fn normalize(trade: &TradeEvent) -> EngineResult<NormalizedTrade> {
    let shares = Scale::Quantity.round(trade.shares);
    let price = Scale::Price.round(trade.price_per_share);
    let fees = Scale::Currency.round(trade.fees);

    if shares <= Decimal::ZERO {
        return Err(EngineError::validation("shares", "must be greater than zero"));
    }
    if price <= Decimal::ZERO {
        return Err(EngineError::validation("price_per_share", "must be greater than zero"));
    }
    if fees < Decimal::ZERO {
        return Err(EngineError::validation("fees", "must not be negative"));
    }
    Ok(NormalizedTrade { shares, price, fees })
}

fn gross_amount(trade: &NormalizedTrade) -> EngineResult<Decimal> {
    Ok(Scale::Currency.round(decimal::multiply(trade.shares, trade.price, "trade amount")?))
}

pub fn apply_buy(position: &InvestmentPosition, trade: &TradeEvent) -> EngineResult<InvestmentPosition> {
    let trade = normalize(trade)?;
    buy(position, &trade)
}

fn buy(position: &InvestmentPosition, trade: &NormalizedTrade) -> EngineResult<InvestmentPosition> {
    let total_shares = position.total_shares + trade.shares;
    let total_invested = position.total_invested + gross_amount(trade)? + trade.fees;
    let average_cost = decimal::divide(total_invested, total_shares, Scale::Price, "average cost")?;

    Ok(InvestmentPosition {
        total_shares,
        total_invested,
        average_cost,
        ..position.clone()
    })
}

pub fn apply_sell(position: &InvestmentPosition, trade: &TradeEvent) -> EngineResult<InvestmentPosition> {
    let trade = normalize(trade)?;
    sell(position, &trade)
}

fn sell(position: &InvestmentPosition, trade: &NormalizedTrade) -> EngineResult<InvestmentPosition> {
    if trade.shares > position.total_shares {
        return Err(EngineError::InsufficientShares {
            symbol: position.symbol.clone(),
            requested: trade.shares,
            held: position.total_shares,
        });
    }

    let total_shares = position.total_shares - trade.shares;
    if total_shares.is_zero() {
        // closing sell: no basis survives an empty position
        return Ok(InvestmentPosition {
            total_shares,
            total_invested: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            ..position.clone()
        });
    }

    let cost_reduction = Scale::Currency.round(decimal::multiply(
        position.average_cost,
        trade.shares,
        "cost reduction",
    )?);
    let total_invested = (position.total_invested - cost_reduction).max(Decimal::ZERO);

    Ok(InvestmentPosition {
        total_shares,
        total_invested,
        ..position.clone()
    })
}

/// Applies one trade and builds the transaction record to persist.
pub fn apply_trade(position: &InvestmentPosition, trade: &TradeEvent) -> EngineResult<TradeResult> {
    let normalized = normalize(trade)?;
    let next = match trade.side {
        TradeSide::Buy => buy(position, &normalized)?,
        TradeSide::Sell => sell(position, &normalized)?,
    };

    debug!(
        symbol = %position.symbol,
        side = %trade.side,
        shares = %normalized.shares,
        price = %normalized.price,
        total_shares = %next.total_shares,
        average_cost = %next.average_cost,
        "Applied trade"
    );

    let record = TransactionRecord {
        symbol: position.symbol.clone(),
        side: trade.side,
        shares: normalized.shares,
        price_per_share: normalized.price,
        total_amount: gross_amount(&normalized)?,
        fees: normalized.fees,
        date: trade.date,
        notes: trade.notes.clone(),
    };

    Ok(TradeResult { position: next, record })
}

/// Applies trades in order; the first rejected trade aborts the replay.
pub fn replay(
    position: &InvestmentPosition,
    trades: &[TradeEvent],
) -> EngineResult<(InvestmentPosition, Vec<TransactionRecord>)> {
    let mut state = position.clone();
    let mut records = Vec::with_capacity(trades.len());
    for trade in trades {
        let result = apply_trade(&state, trade)?;
        records.push(result.record);
        state = result.position;
    }
    Ok((state, records))
}
