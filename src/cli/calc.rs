use super::ui;
use crate::core::amortization::{self, DEFAULT_SCHEDULE_WINDOW};
use crate::core::decimal::{Money, Rate};
use crate::core::loan::{LoanCalculation, LoanState, LoanTerms, Schedule};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::Cell;

/// Which part of the amortization schedule to print after the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleView {
    None,
    Window(usize),
    Full,
}

impl ScheduleView {
    pub fn from_flags(show: bool, window: Option<usize>, full: bool) -> Self {
        match (show || window.is_some() || full, full) {
            (false, _) => ScheduleView::None,
            (true, true) => ScheduleView::Full,
            (true, false) => ScheduleView::Window(window.unwrap_or(DEFAULT_SCHEDULE_WINDOW)),
        }
    }
}

pub fn render_calculation(calc: &LoanCalculation, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Item"), ui::header_cell(&format!("Amount ({currency})"))]);
    table.add_row(vec![Cell::new("Monthly payment"), ui::decimal_cell(calc.monthly_payment, 2)]);
    table.add_row(vec![Cell::new("Total payment"), ui::decimal_cell(calc.total_payment, 2)]);
    table.add_row(vec![Cell::new("Total interest"), ui::decimal_cell(calc.total_interest, 2)]);
    table.add_row(vec![Cell::new("Payments"), Cell::new(calc.term_months)]);
    table.add_row(vec![Cell::new("Payoff date"), Cell::new(calc.payoff_date)]);

    format!(
        "{}\n\n{}",
        ui::style_text("Loan Calculator", ui::StyleType::Title),
        table
    )
}

pub fn render_schedule(schedule: &Schedule) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Date"),
        ui::header_cell("Payment"),
        ui::header_cell("Principal"),
        ui::header_cell("Interest"),
        ui::header_cell("Balance"),
    ]);
    for entry in schedule {
        table.add_row(vec![
            Cell::new(entry.payment_number),
            Cell::new(entry.date),
            ui::decimal_cell(entry.payment, 2),
            ui::decimal_cell(entry.principal, 2),
            ui::decimal_cell(entry.interest, 2),
            ui::decimal_cell(entry.balance, 2),
        ]);
    }
    table.to_string()
}

pub fn run(
    principal: Money,
    annual_rate_percent: Rate,
    term_months: u32,
    view: ScheduleView,
    today: NaiveDate,
    currency: &str,
) -> Result<()> {
    let calc = amortization::compute_monthly_payment(principal, annual_rate_percent, term_months, today)
        .context("Failed to compute loan payment")?;
    println!("{}", render_calculation(&calc, currency));

    if view == ScheduleView::None {
        return Ok(());
    }
    let loan = originate_today(principal, annual_rate_percent, term_months, today)?;
    let schedule = match view {
        ScheduleView::Window(window) => amortization::generate_schedule(&loan, window)?,
        _ => amortization::full_schedule(&loan)?,
    };
    println!("\n{}", render_schedule(&schedule));
    Ok(())
}

fn originate_today(
    principal: Money,
    annual_rate_percent: Rate,
    term_months: u32,
    today: NaiveDate,
) -> Result<LoanState> {
    let terms = LoanTerms {
        name: "Calculator".to_string(),
        kind: None,
        principal,
        annual_rate_percent,
        term_months,
        start_date: today,
        notes: None,
    };
    Ok(amortization::originate(&terms)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_schedule_view_flags() {
        assert_eq!(ScheduleView::from_flags(false, None, false), ScheduleView::None);
        assert_eq!(ScheduleView::from_flags(true, None, false), ScheduleView::Window(12));
        assert_eq!(ScheduleView::from_flags(false, Some(3), false), ScheduleView::Window(3));
        assert_eq!(ScheduleView::from_flags(false, None, true), ScheduleView::Full);
    }

    #[test]
    fn test_render_calculation() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let calc = amortization::compute_monthly_payment(dec!(300000), dec!(3.5), 360, today).unwrap();
        let output = render_calculation(&calc, "USD");
        assert!(output.contains("1347.13"));
        assert!(output.contains("484966.80"));
        assert!(output.contains("184966.80"));
        assert!(output.contains("2054-01-15"));
    }

    #[test]
    fn test_render_schedule() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let loan = originate_today(dec!(10000), dec!(6), 12, today).unwrap();
        let output = render_schedule(&amortization::full_schedule(&loan).unwrap());
        assert!(output.contains("860.66"));
        assert!(output.contains("9189.34"));
        assert!(output.contains("860.70"));
    }

    #[test]
    fn test_run_rejects_zero_term() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = run(dec!(1000), dec!(5), 0, ScheduleView::None, today, "USD").unwrap_err();
        assert_eq!(err.to_string(), "Failed to compute loan payment");
    }
}
