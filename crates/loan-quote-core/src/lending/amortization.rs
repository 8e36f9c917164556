//! Annuity amortization: level monthly installment and total repayable
//! amount from principal, nominal rate, term and fees.
//!
//! Nothing here is rounded. Rounding to the quoted precision happens once, in
//! `lending::quote::assemble`, so errors do not compound.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanQuoteError;
use crate::lending::{MAX_AMOUNT, MAX_INTEREST_RATE, MAX_MATURITY_MONTHS, MONTHS_PER_YEAR, PERCENT};
use crate::time_value;
use crate::types::{Count, Money, Percent, Rate};
use crate::LoanQuoteResult;

/// Unrounded result of amortizing a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amortization {
    /// Nominal annual rate / 12 / 100.
    pub periodic_rate: Rate,
    /// Annuity installment covering principal and interest only.
    pub base_installment: Money,
    /// Base installment plus the per-period administration fee.
    pub monthly_payment: Money,
    /// `monthly_payment × maturity + conclusion_fee`.
    pub total_repayable_amount: Money,
}

/// Convert a nominal annual percentage to the monthly periodic rate.
pub fn periodic_rate(annual_percent: Percent) -> Rate {
    annual_percent / MONTHS_PER_YEAR / PERCENT
}

/// Compute the monthly payment and total repayable amount.
///
/// The administration fee is added to every installment; the conclusion fee
/// is charged once and only appears in the total.
pub fn amortize(
    amount: Money,
    interest_rate: Percent,
    maturity_months: Count,
    administration_fee: Money,
    conclusion_fee: Money,
) -> LoanQuoteResult<Amortization> {
    validate_amortization_input(amount, interest_rate, maturity_months)?;

    let rate = periodic_rate(interest_rate);
    let base_installment = time_value::pmt(rate, maturity_months, amount)?;
    let monthly_payment = base_installment + administration_fee;
    let total_repayable_amount = monthly_payment * Decimal::from(maturity_months) + conclusion_fee;

    Ok(Amortization {
        periodic_rate: rate,
        base_installment,
        monthly_payment,
        total_repayable_amount,
    })
}

fn validate_amortization_input(
    amount: Money,
    interest_rate: Percent,
    maturity_months: Count,
) -> LoanQuoteResult<()> {
    if amount <= Decimal::ZERO || amount > MAX_AMOUNT {
        return Err(LoanQuoteError::invalid(
            "amount",
            format!("Principal must be positive and at most {MAX_AMOUNT}"),
        ));
    }
    if interest_rate < Decimal::ZERO || interest_rate > MAX_INTEREST_RATE {
        return Err(LoanQuoteError::invalid(
            "interestRate",
            format!("Interest rate must be between 0 and {MAX_INTEREST_RATE} percent"),
        ));
    }
    if maturity_months == 0 {
        return Err(LoanQuoteError::invalid(
            "maturity",
            "Maturity must be at least 1 month",
        ));
    }
    if maturity_months > MAX_MATURITY_MONTHS {
        return Err(LoanQuoteError::invalid(
            "maturity",
            format!("Maturity cannot exceed {MAX_MATURITY_MONTHS} months"),
        ));
    }
    Ok(())
}
