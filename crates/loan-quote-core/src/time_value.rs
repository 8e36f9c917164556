//! Level-payment annuity arithmetic shared by the amortization engine, the
//! APR solver and the repayment schedule.
//!
//! Payments are in arrears (first payment one period after disbursement) and
//! all quantities are positive for a positive principal.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::LoanQuoteError;
use crate::types::{Money, Rate};
use crate::LoanQuoteResult;

/// Discount factor `(1 + rate)^-periods`.
pub fn discount_factor(rate: Rate, periods: u32) -> LoanQuoteResult<Decimal> {
    if rate <= -Decimal::ONE {
        return Err(LoanQuoteError::invalid(
            "rate",
            "Periodic rate must be greater than -100%",
        ));
    }

    let v = Decimal::ONE / (Decimal::ONE + rate);
    v.checked_powi(i64::from(periods))
        .ok_or_else(|| LoanQuoteError::FinancialImpossibility(format!(
            "discount factor overflows at rate {rate} over {periods} periods"
        )))
}

/// Present value of `nper` level payments of `payment` discounted at `rate`.
pub fn annuity_pv(rate: Rate, nper: u32, payment: Money) -> LoanQuoteResult<Money> {
    if rate.is_zero() {
        return Ok(payment * Decimal::from(nper));
    }

    let v_n = discount_factor(rate, nper)?;
    Ok(payment * (Decimal::ONE - v_n) / rate)
}

/// Level payment (PMT) that amortizes `present_value` to zero over `nper`
/// periods at `rate`.
///
/// Uses the discount-factor form `PV·r / (1 − (1 + r)^−n)`, which cannot
/// overflow for high rates or long terms because `(1 + r)^−n` only shrinks.
pub fn pmt(rate: Rate, nper: u32, present_value: Money) -> LoanQuoteResult<Money> {
    if nper == 0 {
        return Err(LoanQuoteError::invalid(
            "nper",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(present_value / Decimal::from(nper));
    }

    let v_n = discount_factor(rate, nper)?;
    let denominator = Decimal::ONE - v_n;

    if denominator.is_zero() {
        return Err(LoanQuoteError::DivisionByZero {
            context: "PMT annuity denominator".into(),
        });
    }

    Ok(present_value * rate / denominator)
}
