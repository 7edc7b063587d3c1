use super::calc::ScheduleView;
use super::{loans, portfolio, ui};
use crate::core::config::AppConfig;
use crate::core::net_worth::{self, NetWorth};
use crate::core::quote::QuoteSource;
use crate::core::valuation::StaleQuote;
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::debug;

/// Net worth of the whole book, with the quotes that could not be refreshed.
#[derive(Debug)]
pub struct NetWorthReport {
    pub net_worth: NetWorth,
    pub stale: Vec<StaleQuote>,
}

/// Replays every loan, values the portfolio and totals the book.
///
/// A loan that fails to replay aborts the report, since its balance would be
/// missing from the liabilities.
pub async fn summarize(config: &AppConfig, source: &dyn QuoteSource) -> Result<NetWorthReport> {
    let loan_states = config
        .loans
        .iter()
        .map(|loan| loans::build_report(loan, ScheduleView::None).map(|report| report.loan))
        .collect::<Result<Vec<_>>>()?;

    let summary = if config.investments.is_empty() {
        None
    } else {
        Some(portfolio::summarize(&config.investments, source).await?)
    };

    let net_worth = net_worth::compute_net_worth(&loan_states, summary.as_ref(), &config.assets)
        .context("Failed to compute net worth")?;
    debug!(net_worth = %net_worth.net_worth, "Summarized book");

    Ok(NetWorthReport {
        net_worth,
        stale: summary.map(|s| s.stale).unwrap_or_default(),
    })
}

impl NetWorthReport {
    pub fn display_as_table(&self, currency: &str) -> String {
        let worth = &self.net_worth;

        let mut assets = ui::new_styled_table();
        assets.set_header(vec![
            ui::header_cell("Asset"),
            ui::header_cell("Type"),
            ui::header_cell(&format!("Value ({currency})")),
            ui::header_cell("Source"),
        ]);
        for asset in &worth.assets {
            let source = if asset.auto_calculated { "positions" } else { "manual" };
            assets.add_row(vec![
                Cell::new(&asset.name),
                Cell::new(asset.kind),
                ui::decimal_cell(asset.value, 2),
                Cell::new(source),
            ]);
        }

        let mut liabilities = ui::new_styled_table();
        liabilities.set_header(vec![
            ui::header_cell("Loan"),
            ui::header_cell(&format!("Balance ({currency})")),
            ui::header_cell("Monthly"),
            ui::header_cell("Progress"),
        ]);
        for loan in &worth.liabilities {
            let name = match &loan.kind {
                Some(kind) => format!("{} ({kind})", loan.name),
                None => loan.name.clone(),
            };
            liabilities.add_row(vec![
                Cell::new(name),
                ui::decimal_cell(loan.remaining_balance, 2),
                ui::decimal_cell(loan.monthly_payment, 2),
                Cell::new(format!("{}%", ui::format_decimal(loan.progress_percent, 2))),
            ]);
        }

        let mut output = ui::style_text("Net Worth", ui::StyleType::Title);
        if worth.assets.is_empty() {
            output.push_str(&format!("\n\n{}", ui::style_text("No assets", ui::StyleType::Subtle)));
        } else {
            output.push_str(&format!("\n\n{}\n{}", ui::style_text("Assets", ui::StyleType::TotalLabel), assets));
        }
        if worth.liabilities.is_empty() {
            output.push_str(&format!("\n\n{}", ui::style_text("No loans", ui::StyleType::Subtle)));
        } else {
            output.push_str(&format!(
                "\n\n{}\n{}",
                ui::style_text("Liabilities", ui::StyleType::TotalLabel),
                liabilities
            ));
        }

        let net_style = if worth.net_worth.is_sign_negative() && !worth.net_worth.is_zero() {
            ui::StyleType::Error
        } else {
            ui::StyleType::TotalValue
        };
        output.push_str(&format!(
            "\n\n{} {}\n{} {}\n{} {}",
            ui::style_text(&format!("Total Assets ({currency}):"), ui::StyleType::TotalLabel),
            ui::format_decimal(worth.total_assets, 2),
            ui::style_text(&format!("Total Liabilities ({currency}):"), ui::StyleType::TotalLabel),
            ui::format_decimal(worth.total_liabilities, 2),
            ui::style_text(&format!("Net Worth ({currency}):"), ui::StyleType::TotalLabel),
            ui::style_text(&ui::format_decimal(worth.net_worth, 2), net_style),
        ));

        for stale in &self.stale {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("* {}: last known price used ({})", stale.symbol, stale.reason),
                    ui::StyleType::Warning
                )
            ));
        }

        output
    }
}

pub async fn run(config: &AppConfig, source: &dyn QuoteSource) -> Result<()> {
    let report = summarize(config, source).await?;
    println!("{}", report.display_as_table(&config.currency));
    Ok(())
}
