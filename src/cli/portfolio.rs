use super::ui;
use crate::core::config::PositionConfig;
use crate::core::cost_basis;
use crate::core::position::{InvestmentPosition, normalize_symbol};
use crate::core::quote::{QuoteSource, refresh_quotes};
use crate::core::valuation::{self, PortfolioSummary};
use anyhow::{Context, Result};
use comfy_table::Cell;
use rust_decimal::Decimal;
use tracing::debug;

/// Rebuilds a position from its trade history. The starting price is the
/// book's last known price, or the price of the latest trade.
pub fn build_position(config: &PositionConfig) -> Result<InvestmentPosition> {
    let last_price = config
        .last_price
        .or_else(|| config.trades.iter().max_by_key(|t| t.date).map(|t| t.price_per_share))
        .unwrap_or(Decimal::ZERO);

    let opened = InvestmentPosition::open(&config.symbol, last_price).with_name(config.name.clone());
    let (position, records) = cost_basis::replay(&opened, &config.trades)
        .with_context(|| format!("Failed to apply trades for {}", opened.symbol))?;
    debug!(symbol = %position.symbol, trades = records.len(), "Replayed position");
    Ok(position)
}

impl PortfolioSummary {
    pub fn display_as_table(&self, currency: &str) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell("Shares"),
            ui::header_cell("Avg Cost"),
            ui::header_cell("Price"),
            ui::header_cell(&format!("Invested ({currency})")),
            ui::header_cell(&format!("Value ({currency})")),
            ui::header_cell("P/L"),
            ui::header_cell("P/L (%)"),
        ]);

        for valuation in &self.positions {
            let position = &valuation.position;
            let label = match &position.name {
                Some(name) => format!("{} ({name})", position.symbol),
                None => position.symbol.clone(),
            };
            let price = if valuation.stale {
                Cell::new(format!("{}*", ui::format_decimal(position.current_price, 2)))
                    .fg(comfy_table::Color::Yellow)
                    .set_alignment(comfy_table::CellAlignment::Right)
            } else {
                ui::decimal_cell(position.current_price, 2)
            };

            table.add_row(vec![
                Cell::new(label),
                ui::decimal_cell(position.total_shares, 4),
                ui::decimal_cell(position.average_cost, 2),
                price,
                ui::decimal_cell(position.total_invested, 2),
                ui::decimal_cell(valuation.current_value, 2),
                ui::change_cell(valuation.profit_loss, ""),
                ui::change_cell(valuation.profit_loss_percent, "%"),
            ]);
        }

        let mut output = format!(
            "{}\n\n{}",
            ui::style_text("Portfolio", ui::StyleType::Title),
            table
        );

        let total_style = if self.total_profit_loss.is_sign_negative() && !self.total_profit_loss.is_zero() {
            ui::StyleType::Error
        } else {
            ui::StyleType::TotalValue
        };
        output.push_str(&format!(
            "\n\n{} {}\n{} {}\n{} {}",
            ui::style_text(&format!("Total Invested ({currency}):"), ui::StyleType::TotalLabel),
            ui::format_decimal(self.total_invested, 2),
            ui::style_text(&format!("Current Value ({currency}):"), ui::StyleType::TotalLabel),
            ui::style_text(&ui::format_decimal(self.current_value, 2), ui::StyleType::TotalValue),
            ui::style_text("Profit/Loss:", ui::StyleType::TotalLabel),
            ui::style_text(
                &format!(
                    "{} ({}%)",
                    ui::format_decimal(self.total_profit_loss, 2),
                    ui::format_decimal(self.profit_loss_percent, 2)
                ),
                total_style
            ),
        ));

        if !self.stale.is_empty() {
            output.push('\n');
            for stale in &self.stale {
                output.push_str(&format!(
                    "\n{}",
                    ui::style_text(
                        &format!("* {}: last known price used ({})", stale.symbol, stale.reason),
                        ui::StyleType::Warning
                    )
                ));
            }
        }

        output
    }
}

/// Replays every position, refreshes quotes and values the portfolio.
pub async fn summarize(positions: &[PositionConfig], source: &dyn QuoteSource) -> Result<PortfolioSummary> {
    let positions = positions
        .iter()
        .map(build_position)
        .collect::<Result<Vec<_>>>()?;

    let symbols: Vec<String> = positions.iter().map(|p| normalize_symbol(&p.symbol)).collect();
    let pb = ui::new_progress_bar(symbols.len() as u64, true)?;
    pb.set_message("Fetching quotes...");
    let quotes = refresh_quotes(source, symbols, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    Ok(valuation::valuate(&positions, &quotes)?)
}

pub async fn run(positions: &[PositionConfig], source: &dyn QuoteSource, currency: &str) -> Result<()> {
    if positions.is_empty() {
        println!("{}", ui::style_text("No investments in the book", ui::StyleType::Subtle));
        return Ok(());
    }

    let summary = summarize(positions, source).await?;
    println!("{}", summary.display_as_table(currency));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::EngineError;
    use crate::core::position::{TradeEvent, TradeSide};
    use crate::core::quote::tests::MockQuoteSource;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn trade(side: TradeSide, shares: Decimal, price: Decimal, day: u32) -> TradeEvent {
        TradeEvent {
            side,
            shares,
            price_per_share: price,
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            fees: Decimal::ZERO,
            notes: None,
        }
    }

    fn book() -> Vec<PositionConfig> {
        vec![
            PositionConfig {
                symbol: "aapl".to_string(),
                name: Some("Apple".to_string()),
                last_price: None,
                trades: vec![
                    trade(TradeSide::Buy, dec!(10), dec!(100), 2),
                    trade(TradeSide::Buy, dec!(10), dec!(120), 9),
                ],
            },
            PositionConfig {
                symbol: "MSFT".to_string(),
                name: None,
                last_price: Some(dec!(300)),
                trades: vec![trade(TradeSide::Buy, dec!(2), dec!(250), 3)],
            },
        ]
    }

    #[test]
    fn test_build_position_uses_latest_trade_price() {
        let position = build_position(&book()[0]).unwrap();
        assert_eq!(position.symbol, "AAPL");
        assert_eq!(position.total_shares, dec!(20));
        assert_eq!(position.total_invested, dec!(2200.00));
        assert_eq!(position.average_cost, dec!(110));
        assert_eq!(position.current_price, dec!(120));
    }

    #[test]
    fn test_build_position_rejects_oversell() {
        let config = PositionConfig {
            symbol: "AAPL".to_string(),
            name: None,
            last_price: None,
            trades: vec![trade(TradeSide::Sell, dec!(1), dec!(100), 2)],
        };
        let err = build_position(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InsufficientShares { .. })
        ));
    }

    #[tokio::test]
    async fn test_summarize_marks_failed_quotes_stale() {
        let source = MockQuoteSource::new(&[("AAPL", dec!(130))]);
        let summary = summarize(&book(), &source).await.unwrap();

        assert_eq!(summary.positions[0].current_value, dec!(2600.00));
        assert_eq!(summary.positions[0].profit_loss, dec!(400.00));
        assert!(!summary.positions[0].stale);

        let msft = &summary.positions[1];
        assert!(msft.stale);
        assert_eq!(msft.current_value, dec!(600.00));
        assert_eq!(summary.stale.len(), 1);
        assert_eq!(summary.stale[0].symbol, "MSFT");

        assert_eq!(summary.total_invested, dec!(2700.00));
        assert_eq!(summary.current_value, dec!(3200.00));

        let output = summary.display_as_table("USD");
        assert!(output.contains("last known price used"));
        assert!(output.contains("3200.00"));
    }
}
