//! Loan aggregates and the values derived from them.

use crate::core::decimal::{self, Money, Rate, Scale};
use crate::core::error::EngineResult;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Terms of a new loan, as supplied at origination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    pub principal: Money,
    pub annual_rate_percent: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Snapshot of a loan. Only the payment ledger produces a snapshot with a
/// different `remaining_balance` or `payments_made`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanState {
    pub name: String,
    pub kind: Option<String>,
    pub principal: Money,
    pub annual_rate_percent: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub monthly_payment: Money,
    pub remaining_balance: Money,
    pub payments_made: u32,
    pub notes: Option<String>,
}

/// Output of the loan calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCalculation {
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub payoff_date: NaiveDate,
    pub term_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProgress {
    pub remaining_payments: u32,
    pub total_paid: Money,
    pub progress_percent: Decimal,
    pub next_payment_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub extra: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Append-only ledger entry produced by applying a [`PaymentEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub date: NaiveDate,
    pub amount: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub new_balance: Money,
    pub extra: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub payment_number: u32,
    pub date: NaiveDate,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub balance: Money,
}

pub type Schedule = Vec<AmortizationEntry>;

/// `annual / 100 / 12`, unrounded.
pub fn monthly_rate(annual_rate_percent: Rate) -> Decimal {
    annual_rate_percent / dec!(100) / dec!(12)
}

impl LoanState {
    pub fn monthly_rate(&self) -> Decimal {
        monthly_rate(self.annual_rate_percent)
    }

    pub fn remaining_payments(&self) -> u32 {
        self.term_months.saturating_sub(self.payments_made)
    }

    pub fn is_paid_off(&self) -> bool {
        self.remaining_balance.is_zero()
    }

    pub fn end_date(&self) -> EngineResult<NaiveDate> {
        decimal::add_months(self.start_date, self.term_months)
    }

    pub fn progress(&self) -> EngineResult<LoanProgress> {
        let progress_percent = if self.term_months == 0 {
            Decimal::ZERO
        } else {
            Scale::Currency.round(
                Decimal::from(self.payments_made) / Decimal::from(self.term_months) * dec!(100),
            )
        };

        Ok(LoanProgress {
            remaining_payments: self.remaining_payments(),
            total_paid: self.principal - self.remaining_balance,
            progress_percent,
            next_payment_date: decimal::add_months(self.start_date, self.payments_made + 1)?,
            end_date: self.end_date()?,
        })
    }
}
