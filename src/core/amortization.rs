//! Level-payment loan calculator and amortization schedule projection.

use crate::core::decimal::{self, Money, Rate, Scale};
use crate::core::error::{EngineError, EngineResult};
use crate::core::loan::{AmortizationEntry, LoanCalculation, LoanState, LoanTerms, Schedule, monthly_rate};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

/// Number of entries projected when the caller does not ask for more.
pub const DEFAULT_SCHEDULE_WINDOW: usize = 12;

/// Longest accepted term, 100 years of monthly payments.
pub const MAX_TERM_MONTHS: u32 = 1200;

fn validate_terms(principal: Money, annual_rate_percent: Rate, term_months: u32) -> EngineResult<()> {
    if principal <= Decimal::ZERO {
        return Err(EngineError::validation("principal", "must be greater than zero"));
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(EngineError::validation("annual_rate_percent", "must not be negative"));
    }
    if term_months == 0 {
        return Err(EngineError::validation("term_months", "must be at least 1"));
    }
    if term_months > MAX_TERM_MONTHS {
        return Err(EngineError::validation(
            "term_months",
            format!("must not exceed {MAX_TERM_MONTHS}"),
        ));
    }
    Ok(())
}

/// Level monthly payment, rounded to cents.
///
/// `P * r * (1+r)^n / ((1+r)^n - 1)` with `r = annual / 100 / 12`, or `P / n`
/// for a zero-interest loan. The principal is taken at cent precision.
pub fn level_payment(principal: Money, annual_rate_percent: Rate, term_months: u32) -> EngineResult<Money> {
    let principal = Scale::Currency.round(principal);
    validate_terms(principal, annual_rate_percent, term_months)?;

    let n = Decimal::from(term_months);
    let r = monthly_rate(annual_rate_percent);
    if r.is_zero() {
        return decimal::divide(principal, n, Scale::Currency, "zero-rate payment");
    }

    let growth = decimal::powi(Decimal::ONE + r, term_months, "compound factor")?;
    let numerator = decimal::multiply(decimal::multiply(principal, r, "payment numerator")?, growth, "payment numerator")?;
    decimal::divide(numerator, growth - Decimal::ONE, Scale::Currency, "annuity factor")
}

/// Loan calculator: payment, totals and payoff date counted from `today`.
pub fn compute_monthly_payment(
    principal: Money,
    annual_rate_percent: Rate,
    term_months: u32,
    today: NaiveDate,
) -> EngineResult<LoanCalculation> {
    let principal = Scale::Currency.round(principal);
    let monthly_payment = level_payment(principal, annual_rate_percent, term_months)?;
    let total_payment = decimal::multiply(monthly_payment, Decimal::from(term_months), "total payment")?;
    let total_interest = total_payment - principal;
    let payoff_date = decimal::add_months(today, term_months)?;

    debug!(
        %principal,
        %annual_rate_percent,
        term_months,
        %monthly_payment,
        "Computed level payment"
    );

    Ok(LoanCalculation {
        monthly_payment,
        total_payment,
        total_interest,
        payoff_date,
        term_months,
    })
}

/// Opens a loan: nothing paid yet, balance equal to principal.
pub fn originate(terms: &LoanTerms) -> EngineResult<LoanState> {
    let principal = Scale::Currency.round(terms.principal);
    let monthly_payment = level_payment(principal, terms.annual_rate_percent, terms.term_months)?;

    Ok(LoanState {
        name: terms.name.clone(),
        kind: terms.kind.clone(),
        principal,
        annual_rate_percent: terms.annual_rate_percent,
        term_months: terms.term_months,
        start_date: terms.start_date,
        monthly_payment,
        remaining_balance: principal,
        payments_made: 0,
        notes: terms.notes.clone(),
    })
}

/// Projects up to `window` future entries from the loan's current state,
/// assuming the contractual payment continues unchanged.
///
/// The entry numbered `term_months` pays off whatever balance is left, so a
/// schedule covering the whole term always ends at exactly zero.
pub fn generate_schedule(loan: &LoanState, window: usize) -> EngineResult<Schedule> {
    let r = loan.monthly_rate();
    let first_due = loan.start_date;
    let count = window.min(loan.remaining_payments() as usize);

    let mut schedule = Vec::with_capacity(count);
    let mut balance = loan.remaining_balance;

    for i in 0..count as u32 {
        if balance <= Decimal::ZERO {
            break;
        }
        let payment_number = loan.payments_made + i + 1;

        let interest = Scale::Currency.round(decimal::multiply(balance, r, "scheduled interest")?);
        let mut principal = (loan.monthly_payment - interest).max(Decimal::ZERO);
        if principal > balance || payment_number == loan.term_months {
            principal = balance;
        }
        balance = (balance - principal).max(Decimal::ZERO);

        schedule.push(AmortizationEntry {
            payment_number,
            date: decimal::add_months(first_due, payment_number)?,
            payment: principal + interest,
            principal,
            interest,
            balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    debug!(loan = %loan.name, entries = schedule.len(), window, "Generated schedule");
    Ok(schedule)
}

/// The whole remaining schedule, regardless of the default window.
pub fn full_schedule(loan: &LoanState) -> EngineResult<Schedule> {
    generate_schedule(loan, loan.remaining_payments() as usize)
}
