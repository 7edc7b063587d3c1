//! Fixed-scale decimal helpers shared by every calculation.
//!
//! All rounding goes through [`Scale::round`], which rounds half-up
//! (midpoint away from zero). Intermediate products and quotients keep the
//! full 28-digit precision of [`Decimal`] until a caller rounds them.

use crate::core::error::{EngineError, EngineResult};
use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Currency amounts: balances, payments, invested totals.
pub type Money = Decimal;

/// Share quantities.
pub type Shares = Decimal;

/// Per-share prices and average costs.
pub type Price = Decimal;

/// Rates as percentages (3.5 means 3.5%).
pub type Rate = Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Currency,
    Quantity,
    Price,
    Ratio,
}

impl Scale {
    pub fn dp(self) -> u32 {
        match self {
            Scale::Currency => 2,
            Scale::Quantity | Scale::Price | Scale::Ratio => 4,
        }
    }

    pub fn round(self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.dp(), RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Divides and rounds to `scale`. A zero divisor is an error, never zero.
pub fn divide(
    numerator: Decimal,
    denominator: Decimal,
    scale: Scale,
    context: &str,
) -> EngineResult<Decimal> {
    let quotient = divide_exact(numerator, denominator, context)?;
    Ok(scale.round(quotient))
}

/// Divides without rounding the quotient.
pub fn divide_exact(numerator: Decimal, denominator: Decimal, context: &str) -> EngineResult<Decimal> {
    if denominator.is_zero() {
        return Err(EngineError::DivisionByZero {
            context: context.to_string(),
        });
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| EngineError::Overflow {
            context: context.to_string(),
        })
}

pub fn multiply(a: Decimal, b: Decimal, context: &str) -> EngineResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| EngineError::Overflow {
        context: context.to_string(),
    })
}

/// `round(part / whole, 4) * 100`, the display percentage.
pub fn percent_of(part: Decimal, whole: Decimal, context: &str) -> EngineResult<Decimal> {
    let ratio = divide(part, whole, Scale::Ratio, context)?;
    Ok(ratio * dec!(100))
}

/// Integer power by repeated squaring. Avoids `powd` drift so the result is
/// identical on every platform.
pub fn powi(base: Decimal, exponent: u32, context: &str) -> EngineResult<Decimal> {
    let mut result = Decimal::ONE;
    let mut factor = base;
    let mut remaining = exponent;
    while remaining > 0 {
        if remaining & 1 == 1 {
            result = multiply(result, factor, context)?;
        }
        remaining >>= 1;
        if remaining > 0 {
            factor = multiply(factor, factor, context)?;
        }
    }
    Ok(result)
}

/// Calendar-month arithmetic; days past the end of the target month clamp to
/// its last day (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> EngineResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| EngineError::Overflow {
            context: format!("{date} + {months} months"),
        })
}
