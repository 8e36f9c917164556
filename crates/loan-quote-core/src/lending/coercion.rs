//! Truncation of integral request fields.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lending::validation::LoanRequest;
use crate::types::{Count, Money, Percent};

/// Strictly-typed loan terms ready for the amortization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub product_type: String,
    pub amount: Money,
    /// Nominal annual rate in percent.
    pub interest_rate: Percent,
    pub maturity_months: Count,
    pub monthly_payment_day: Count,
    pub administration_fee: Money,
    pub conclusion_fee: Money,
    pub currency: String,
}

/// Drop the fractional part of `maturity` and `monthlyPaymentDay`.
///
/// Truncates toward zero: 12.1 and 12.9 both become 12. Every other field
/// passes through unchanged.
pub fn coerce(request: &LoanRequest) -> LoanTerms {
    LoanTerms {
        product_type: request.product_type.clone(),
        amount: request.amount,
        interest_rate: request.interest_rate,
        maturity_months: truncate_to_count(request.maturity),
        monthly_payment_day: truncate_to_count(request.monthly_payment_day),
        administration_fee: request.administration_fee,
        conclusion_fee: request.conclusion_fee,
        currency: request.currency.clone(),
    }
}

/// Saturating truncation: negatives clamp to 0, values past `u32` to `u32::MAX`.
/// Validated requests never hit either clamp.
fn truncate_to_count(value: Decimal) -> Count {
    let whole = value.trunc();
    if whole.is_sign_negative() {
        return 0;
    }
    whole.to_u32().unwrap_or(Count::MAX)
}
