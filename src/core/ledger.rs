//! Applies loan payments to a loan snapshot.

use crate::core::decimal::{self, Scale};
use crate::core::error::{EngineError, EngineResult};
use crate::core::loan::{LoanState, PaymentEvent, PaymentResult};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Splits `payment` into interest and principal and returns the ledger entry
/// together with the next loan snapshot. `loan` itself is never modified.
///
/// A payment smaller than the interest due pays no principal. The shortfall
/// is not added to the balance, so the unpaid interest is silently deferred.
/// The `extra` flag is kept for reporting and does not change the split.
pub fn apply_payment(loan: &LoanState, payment: &PaymentEvent) -> EngineResult<(PaymentResult, LoanState)> {
    let amount = Scale::Currency.round(payment.amount);
    if amount <= Decimal::ZERO {
        return Err(EngineError::validation("amount", "must be greater than zero"));
    }
    if loan.payments_made >= loan.term_months {
        return Err(EngineError::validation(
            "payments_made",
            format!("all {} payments of {} are already recorded", loan.term_months, loan.name),
        ));
    }
    if loan.is_paid_off() {
        return Err(EngineError::validation(
            "remaining_balance",
            format!("{} is already paid off", loan.name),
        ));
    }

    let interest_portion = Scale::Currency.round(decimal::multiply(
        loan.remaining_balance,
        loan.monthly_rate(),
        "payment interest",
    )?);
    let principal_portion = (amount - interest_portion).max(Decimal::ZERO);
    if principal_portion.is_zero() {
        warn!(
            loan = %loan.name,
            %amount,
            %interest_portion,
            "Payment does not cover interest due; no principal applied"
        );
    }
    let new_balance = (loan.remaining_balance - principal_portion).max(Decimal::ZERO);

    let result = PaymentResult {
        date: payment.date,
        amount,
        interest_portion,
        principal_portion,
        new_balance,
        extra: payment.extra,
        notes: payment.notes.clone(),
    };

    let next = LoanState {
        remaining_balance: new_balance,
        payments_made: loan.payments_made + 1,
        ..loan.clone()
    };

    debug!(
        loan = %loan.name,
        %amount,
        %interest_portion,
        %principal_portion,
        %new_balance,
        "Applied payment"
    );

    Ok((result, next))
}

/// Applies a payment history in order, returning the final snapshot and the
/// ledger entries. Stops at the first rejected payment.
pub fn replay(loan: &LoanState, payments: &[PaymentEvent]) -> EngineResult<(LoanState, Vec<PaymentResult>)> {
    let mut state = loan.clone();
    let mut entries = Vec::with_capacity(payments.len());
    for payment in payments {
        let (entry, next) = apply_payment(&state, payment)?;
        entries.push(entry);
        state = next;
    }
    Ok((state, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amortization::{generate_schedule, originate};
    use crate::core::loan::LoanTerms;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn car_loan() -> LoanState {
        originate(&LoanTerms {
            name: "Car".to_string(),
            kind: Some("auto".to_string()),
            principal: dec!(10000),
            annual_rate_percent: dec!(6),
            term_months: 12,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            notes: None,
        })
        .unwrap()
    }

    fn pay(amount: Decimal) -> PaymentEvent {
        PaymentEvent {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            amount,
            extra: false,
            notes: None,
        }
    }

    #[test]
    fn test_regular_payment_split() {
        let loan = car_loan();
        let (result, next) = apply_payment(&loan, &pay(dec!(860.66))).unwrap();

        assert_eq!(result.interest_portion, dec!(50.00));
        assert_eq!(result.principal_portion, dec!(810.66));
        assert_eq!(result.new_balance, dec!(9189.34));
        assert_eq!(next.remaining_balance, dec!(9189.34));
        assert_eq!(next.payments_made, 1);

        // input snapshot untouched
        assert_eq!(loan.remaining_balance, dec!(10000));
        assert_eq!(loan.payments_made, 0);
    }

    #[test]
    fn test_scheduled_payments_match_schedule() {
        let loan = car_loan();
        let schedule = generate_schedule(&loan, 11).unwrap();
        let payments: Vec<_> = (0..11).map(|_| pay(loan.monthly_payment)).collect();

        let (state, entries) = replay(&loan, &payments).unwrap();
        for (entry, projected) in entries.iter().zip(&schedule) {
            assert_eq!(entry.interest_portion, projected.interest);
            assert_eq!(entry.new_balance, projected.balance);
        }
        assert_eq!(state.payments_made, 11);
        assert_eq!(state.remaining_balance, dec!(856.42));
    }

    #[test]
    fn test_underpayment_floors_principal() {
        let loan = car_loan();
        let (result, next) = apply_payment(&loan, &pay(dec!(20))).unwrap();
        assert_eq!(result.interest_portion, dec!(50.00));
        assert_eq!(result.principal_portion, Decimal::ZERO);
        assert_eq!(next.remaining_balance, dec!(10000));
        assert_eq!(next.payments_made, 1);
    }

    #[test]
    fn test_overpayment_clamps_balance() {
        let loan = car_loan();
        let (result, next) = apply_payment(&loan, &pay(dec!(20000))).unwrap();
        assert_eq!(result.principal_portion, dec!(19950.00));
        assert_eq!(result.new_balance, Decimal::ZERO);
        assert!(next.is_paid_off());
    }

    #[test]
    fn test_extra_payment_counts_as_one() {
        let loan = car_loan();
        let mut event = pay(dec!(500));
        event.extra = true;
        let (result, next) = apply_payment(&loan, &event).unwrap();
        assert!(result.extra);
        assert_eq!(result.principal_portion, dec!(450.00));
        assert_eq!(next.payments_made, 1);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let loan = car_loan();
        for amount in [Decimal::ZERO, dec!(-5), dec!(0.004)] {
            assert!(matches!(
                apply_payment(&loan, &pay(amount)),
                Err(EngineError::Validation { ref field, .. }) if field == "amount"
            ));
        }
    }

    #[test]
    fn test_rejects_payment_after_term() {
        let mut loan = car_loan();
        loan.payments_made = 12;
        loan.remaining_balance = dec!(10);
        assert!(matches!(
            apply_payment(&loan, &pay(dec!(10))),
            Err(EngineError::Validation { ref field, .. }) if field == "payments_made"
        ));
    }

    #[test]
    fn test_rejects_payment_on_paid_off_loan() {
        let mut loan = car_loan();
        loan.remaining_balance = Decimal::ZERO;
        loan.payments_made = 5;
        assert!(apply_payment(&loan, &pay(dec!(10))).is_err());
    }

    #[test]
    fn test_replay_stops_at_rejected_payment() {
        let loan = car_loan();
        let payments = vec![pay(dec!(20000)), pay(dec!(10))];
        assert!(replay(&loan, &payments).is_err());
    }
}
