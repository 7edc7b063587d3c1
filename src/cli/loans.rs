use super::calc::{ScheduleView, render_schedule};
use super::ui;
use crate::core::amortization;
use crate::core::config::LoanConfig;
use crate::core::ledger;
use crate::core::loan::{LoanProgress, LoanState, PaymentResult, Schedule};
use anyhow::{Context, Result};
use comfy_table::Cell;
use tracing::{debug, error};

/// A loan replayed from the book.
#[derive(Debug)]
pub struct LoanReport {
    pub loan: LoanState,
    pub progress: LoanProgress,
    pub payments: Vec<PaymentResult>,
    pub schedule: Schedule,
}

/// Originates the loan, applies every recorded payment in order and projects
/// the schedule from the resulting state.
pub fn build_report(config: &LoanConfig, view: ScheduleView) -> Result<LoanReport> {
    let origin = amortization::originate(&config.terms())
        .with_context(|| format!("Invalid terms for loan '{}'", config.name))?;
    let (loan, payments) = ledger::replay(&origin, &config.payments)
        .with_context(|| format!("Failed to apply payments for loan '{}'", config.name))?;
    let progress = loan.progress()?;
    let schedule = match view {
        ScheduleView::None => Vec::new(),
        ScheduleView::Window(window) => amortization::generate_schedule(&loan, window)?,
        ScheduleView::Full => amortization::full_schedule(&loan)?,
    };
    debug!(loan = %loan.name, payments = payments.len(), "Replayed loan");

    Ok(LoanReport {
        loan,
        progress,
        payments,
        schedule,
    })
}

impl LoanReport {
    pub fn display_as_table(&self, currency: &str) -> String {
        let loan = &self.loan;
        let progress = &self.progress;

        let mut summary = ui::new_styled_table();
        summary.set_header(vec![ui::header_cell("Item"), ui::header_cell(&format!("Value ({currency})"))]);
        summary.add_row(vec![Cell::new("Principal"), ui::decimal_cell(loan.principal, 2)]);
        summary.add_row(vec![
            Cell::new("Annual rate"),
            Cell::new(format!("{}%", ui::format_decimal(loan.annual_rate_percent, 2))),
        ]);
        summary.add_row(vec![Cell::new("Monthly payment"), ui::decimal_cell(loan.monthly_payment, 2)]);
        summary.add_row(vec![Cell::new("Remaining balance"), ui::decimal_cell(loan.remaining_balance, 2)]);
        summary.add_row(vec![
            Cell::new("Payments made"),
            Cell::new(format!("{} of {}", loan.payments_made, loan.term_months)),
        ]);
        summary.add_row(vec![Cell::new("Total paid"), ui::decimal_cell(progress.total_paid, 2)]);
        summary.add_row(vec![
            Cell::new("Progress"),
            Cell::new(format!("{}%", ui::format_decimal(progress.progress_percent, 2))),
        ]);
        summary.add_row(vec![Cell::new("Next payment"), Cell::new(progress.next_payment_date)]);
        summary.add_row(vec![Cell::new("End date"), Cell::new(progress.end_date)]);

        let kind = loan
            .kind
            .as_deref()
            .map(|k| format!(" ({k})"))
            .unwrap_or_default();
        let mut output = format!(
            "Loan: {}{}\n\n{}",
            ui::style_text(&loan.name, ui::StyleType::Title),
            ui::style_text(&kind, ui::StyleType::Subtle),
            summary
        );

        if !self.payments.is_empty() {
            let mut ledger_table = ui::new_styled_table();
            ledger_table.set_header(vec![
                ui::header_cell("Date"),
                ui::header_cell("Amount"),
                ui::header_cell("Interest"),
                ui::header_cell("Principal"),
                ui::header_cell("Balance"),
                ui::header_cell("Notes"),
            ]);
            for payment in &self.payments {
                let mut notes = payment.notes.clone().unwrap_or_default();
                if payment.extra {
                    notes = format!("extra {notes}").trim_end().to_string();
                }
                ledger_table.add_row(vec![
                    Cell::new(payment.date),
                    ui::decimal_cell(payment.amount, 2),
                    ui::decimal_cell(payment.interest_portion, 2),
                    ui::decimal_cell(payment.principal_portion, 2),
                    ui::decimal_cell(payment.new_balance, 2),
                    Cell::new(notes),
                ]);
            }
            output.push_str(&format!(
                "\n\n{}\n{}",
                ui::style_text("Payments", ui::StyleType::TotalLabel),
                ledger_table
            ));
        }

        if !self.schedule.is_empty() {
            output.push_str(&format!(
                "\n\n{}\n{}",
                ui::style_text("Upcoming schedule", ui::StyleType::TotalLabel),
                render_schedule(&self.schedule)
            ));
        } else if loan.is_paid_off() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text("Paid off", ui::StyleType::TotalValue)
            ));
        }

        output
    }
}

pub fn run(loans: &[LoanConfig], view: ScheduleView, currency: &str) -> Result<()> {
    if loans.is_empty() {
        println!("{}", ui::style_text("No loans in the book", ui::StyleType::Subtle));
        return Ok(());
    }

    let mut failed = 0;
    for (i, config) in loans.iter().enumerate() {
        match build_report(config, view) {
            Ok(report) => println!("{}", report.display_as_table(currency)),
            Err(e) => {
                failed += 1;
                error!(loan = %config.name, error = ?e, "Failed to replay loan");
                println!(
                    "Loan: {}\n{}",
                    ui::style_text(&config.name, ui::StyleType::Title),
                    ui::style_text(&format!("{e:#}"), ui::StyleType::Error)
                );
            }
        }
        if i + 1 < loans.len() {
            ui::print_separator();
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} loans could not be replayed", failed, loans.len());
    }
    Ok(())
}
