//! Quote assembly and the end-to-end quotation pipeline.
//!
//! raw JSON → validate → coerce → amortize → solve APR → assemble.

use std::time::Instant;

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::LoanQuoteError;
use crate::lending::amortization::{self, Amortization};
use crate::lending::apr;
use crate::lending::coercion::{self, LoanTerms};
use crate::lending::validation;
use crate::lending::{MONTHS_PER_YEAR, PERCENT};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::LoanQuoteResult;

const MONEY_DP: u32 = 2;
const APR_DP: u32 = 1;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The quoted figures, rounded and in wire order.
///
/// Serializes as JSON numbers:
/// `{"totalRepayableAmount":..,"monthlyPayment":..,"apr":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    #[serde(with = "json_number")]
    pub total_repayable_amount: Money,
    #[serde(with = "json_number")]
    pub monthly_payment: Money,
    #[serde(with = "json_number")]
    pub apr: Percent,
}

/// Decimal as the shortest JSON number: `10000`, not `10000.0`.
mod json_number {
    use rust_decimal::Decimal;
    use serde::{ser, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let number: serde_json::Number = value
            .normalize()
            .to_string()
            .parse()
            .map_err(ser::Error::custom)?;
        number.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer)
    }
}

/// Why a raw request produced no quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The request failed schema validation; messages in field order.
    #[error("request validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The request was valid but the engine could not price it.
    #[error(transparent)]
    Computation(#[from] LoanQuoteError),
}

/// Unrounded intermediates behind a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub quote: LoanQuote,
    pub maturity_months: u32,
    pub monthly_payment_day: u32,
    /// Nominal monthly rate (annual percent / 1200).
    pub periodic_rate: Rate,
    /// Annuity installment before the administration fee.
    pub base_installment: Money,
    pub total_interest: Money,
    pub total_administration_fees: Money,
    /// Monthly rate solving the APR present-value equation.
    pub apr_periodic_rate: Rate,
    /// `(1 + apr_periodic_rate)^12 − 1`, in percent.
    pub effective_annual_rate: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Quote a raw request document.
pub fn quote(raw: &Value) -> Result<LoanQuote, QuoteError> {
    let request = validation::validate(raw).map_err(|messages| {
        warn!(
            violations = messages.len(),
            first = messages.first().map(String::as_str).unwrap_or_default(),
            "loan request rejected"
        );
        QuoteError::Validation(messages)
    })?;
    let terms = coercion::coerce(&request);
    Ok(price(&terms)?)
}

/// Price already coerced terms.
pub fn price(terms: &LoanTerms) -> LoanQuoteResult<LoanQuote> {
    let (amortization, apr_percent) = compute(terms)?;
    Ok(assemble(
        amortization.monthly_payment,
        amortization.total_repayable_amount,
        apr_percent,
    ))
}

/// Round the three figures to quoted precision and package them.
pub fn assemble(monthly_payment: Money, total_repayable_amount: Money, apr: Percent) -> LoanQuote {
    LoanQuote {
        total_repayable_amount: round_money(total_repayable_amount),
        monthly_payment: round_money(monthly_payment),
        apr: round_apr(apr),
    }
}

/// Quote plus the unrounded intermediates, wrapped with methodology metadata.
pub fn explain(terms: &LoanTerms) -> LoanQuoteResult<ComputationOutput<QuoteBreakdown>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (amortization, apr_percent) = compute(terms)?;
    let months = Decimal::from(terms.maturity_months);
    let apr_periodic_rate = apr_percent / MONTHS_PER_YEAR / PERCENT;
    let effective_annual_rate =
        ((Decimal::ONE + apr_periodic_rate).powi(12) - Decimal::ONE) * PERCENT;

    if terms.conclusion_fee > terms.amount / Decimal::TEN {
        warnings.push(format!(
            "Conclusion fee {} exceeds 10% of the principal {}",
            terms.conclusion_fee, terms.amount
        ));
    }

    let breakdown = QuoteBreakdown {
        quote: assemble(
            amortization.monthly_payment,
            amortization.total_repayable_amount,
            apr_percent,
        ),
        maturity_months: terms.maturity_months,
        monthly_payment_day: terms.monthly_payment_day,
        periodic_rate: amortization.periodic_rate,
        base_installment: amortization.base_installment,
        total_interest: amortization.base_installment * months - terms.amount,
        total_administration_fees: terms.administration_fee * months,
        apr_periodic_rate,
        effective_annual_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity amortization with per-installment administration fee; APR by Newton-Raphson with bisection fallback on the net-of-fee present value",
        &serde_json::json!({
            "product_type": terms.product_type,
            "currency": terms.currency,
            "amount": terms.amount.to_string(),
            "interest_rate_pct": terms.interest_rate.to_string(),
            "maturity_months": terms.maturity_months,
        }),
        warnings,
        elapsed,
        breakdown,
    ))
}

/// Round a monetary amount to 2 places, half away from zero.
pub fn round_money(value: Money) -> Money {
    round_half_away(value, MONEY_DP)
}

/// Round an APR percentage to 1 place, half away from zero.
pub fn round_apr(value: Percent) -> Percent {
    round_half_away(value, APR_DP)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn compute(terms: &LoanTerms) -> LoanQuoteResult<(Amortization, Percent)> {
    let amortization = amortization::amortize(
        terms.amount,
        terms.interest_rate,
        terms.maturity_months,
        terms.administration_fee,
        terms.conclusion_fee,
    )?;

    let apr_percent = apr::solve_apr(
        terms.amount,
        amortization.monthly_payment,
        terms.maturity_months,
        terms.conclusion_fee,
        amortization.periodic_rate,
    )?;

    debug!(
        product_type = %terms.product_type,
        monthly_payment = %amortization.monthly_payment,
        apr = %apr_percent,
        "loan priced"
    );

    Ok((amortization, apr_percent))
}

fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn body(maturity: Value, day: Value) -> Value {
        json!({
            "maturity": maturity,
            "productType": "LOANSE02",
            "amount": 97350,
            "interestRate": 10.95,
            "monthlyPaymentDay": day,
            "administrationFee": 40,
            "conclusionFee": 695,
            "currency": "SEK"
        })
    }

    #[test]
    fn test_ten_year_quote() {
        let q = quote(&body(json!(120), json!(27))).unwrap();
        assert_eq!(q.monthly_payment, dec!(1378.24));
        assert_eq!(q.total_repayable_amount, dec!(166084.11));
        assert_eq!(q.apr, dec!(11.8));
    }

    #[test]
    fn test_one_year_quote_serializes_in_wire_order() {
        let q = quote(&body(json!(12), json!(27))).unwrap();
        assert_eq!(
            serde_json::to_string(&q).unwrap(),
            r#"{"totalRepayableAmount":104395.21,"monthlyPayment":8641.68,"apr":13.2}"#
        );
    }

    #[test]
    fn test_fractional_maturity_matches_truncated() {
        let fractional = quote(&body(json!(12.1), json!(27))).unwrap();
        let integral = quote(&body(json!(12), json!(27))).unwrap();
        assert_eq!(fractional, integral);
        assert_eq!(
            serde_json::to_string(&fractional).unwrap(),
            serde_json::to_string(&integral).unwrap()
        );
    }

    #[test]
    fn test_fractional_payment_day_matches_truncated() {
        let fractional = quote(&body(json!(120), json!(27.6))).unwrap();
        let integral = quote(&body(json!(120), json!(27))).unwrap();
        assert_eq!(fractional, integral);
    }

    #[test]
    fn test_borderline_fraction_is_not_rounded_up() {
        let fractional = quote(&body(json!(12.9), json!(27))).unwrap();
        let twelve = quote(&body(json!(12), json!(27))).unwrap();
        assert_eq!(fractional, twelve);
    }

    #[test]
    fn test_repeated_quotes_are_identical() {
        let input = body(json!(120), json!(27));
        let first = serde_json::to_vec(&quote(&input).unwrap()).unwrap();
        let second = serde_json::to_vec(&quote(&input).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_validation_failure_short_circuits() {
        let mut input = body(json!(120), json!(27));
        input.as_object_mut().unwrap().remove("amount");
        match quote(&input) {
            Err(QuoteError::Validation(messages)) => {
                assert_eq!(messages, vec!["should have required property 'amount'"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_fee_swallowing_principal_is_computation_error() {
        let input = json!({
            "maturity": 12,
            "productType": "LOANSE02",
            "amount": 500,
            "interestRate": 5,
            "monthlyPaymentDay": 1,
            "administrationFee": 0,
            "conclusionFee": 500,
            "currency": "SEK"
        });
        assert!(matches!(
            quote(&input),
            Err(QuoteError::Computation(LoanQuoteError::FinancialImpossibility(_)))
        ));
    }

    #[test]
    fn test_interest_free_loan_without_fees() {
        let input = json!({
            "maturity": 10,
            "productType": "ZERO",
            "amount": 10000,
            "interestRate": 0,
            "monthlyPaymentDay": 15,
            "administrationFee": 0,
            "conclusionFee": 0,
            "currency": "EUR"
        });
        let q = quote(&input).unwrap();
        assert_eq!(q.monthly_payment, dec!(1000));
        assert_eq!(q.total_repayable_amount, dec!(10000));
        assert_eq!(q.apr, dec!(0));
        assert_eq!(
            serde_json::to_string(&q).unwrap(),
            r#"{"totalRepayableAmount":10000,"monthlyPayment":1000,"apr":0}"#
        );
    }

    #[test]
    fn test_whole_figures_serialize_without_fraction() {
        let q = assemble(dec!(1000.00), dec!(10000.00), dec!(2200.0));
        assert_eq!(
            serde_json::to_string(&q).unwrap(),
            r#"{"totalRepayableAmount":10000,"monthlyPayment":1000,"apr":2200}"#
        );

        let back: LoanQuote = serde_json::from_str(&serde_json::to_string(&q).unwrap()).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn test_fees_dwarfing_principal_still_quote() {
        let input = json!({
            "maturity": 12,
            "productType": "LOANSE02",
            "amount": 100,
            "interestRate": 0,
            "monthlyPaymentDay": 27,
            "administrationFee": 2000,
            "conclusionFee": 0,
            "currency": "SEK"
        });
        let q = quote(&input).unwrap();
        assert_eq!(q.monthly_payment, dec!(2008.33));
        // Roughly 20x the disbursement per month
        assert!(q.apr > dec!(24000) && q.apr < dec!(24200), "apr {}", q.apr);
    }

    #[test]
    fn test_conclusion_fee_leaving_one_unit_still_quotes() {
        let input = json!({
            "maturity": 600,
            "productType": "LOANSE02",
            "amount": 1e12,
            "interestRate": 10.95,
            "monthlyPaymentDay": 27,
            "administrationFee": 0,
            "conclusionFee": 999999999999u64,
            "currency": "SEK"
        });
        let q = quote(&input).unwrap();
        assert!(q.apr > dec!(1000000000000), "apr {}", q.apr);
    }

    #[test]
    fn test_microscopic_principal_keeps_its_rate() {
        let input = json!({
            "maturity": 12,
            "productType": "LOANSE02",
            "amount": 1e-20,
            "interestRate": 10,
            "monthlyPaymentDay": 27,
            "administrationFee": 0,
            "conclusionFee": 0,
            "currency": "SEK"
        });
        let q = quote(&input).unwrap();
        assert_eq!(q.apr, dec!(10.0));
    }

    #[test]
    fn test_small_loan_quote() {
        let input = json!({
            "maturity": 24,
            "productType": "SMALL",
            "amount": 5000,
            "interestRate": 5,
            "monthlyPaymentDay": 1,
            "administrationFee": 5,
            "conclusionFee": 50,
            "currency": "EUR"
        });
        let q = quote(&input).unwrap();
        assert_eq!(q.monthly_payment, dec!(224.36));
        assert_eq!(q.total_repayable_amount, dec!(5434.57));
        assert_eq!(q.apr, dec!(8.2));
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.35));
        assert_eq!(round_money(dec!(2.335)), dec!(2.34));
        assert_eq!(round_apr(dec!(12.25)), dec!(12.3));
        assert_eq!(round_apr(dec!(12.35)), dec!(12.4));
    }

    #[test]
    fn test_rounding_normalizes_negative_zero() {
        let rounded = round_apr(dec!(-0.00000001));
        assert!(!rounded.is_sign_negative());
        assert_eq!(rounded.to_string(), "0");
    }

    #[test]
    fn test_assemble_rounds_each_figure() {
        let q = assemble(dec!(1378.242563), dec!(166084.107564), dec!(11.848068));
        assert_eq!(q.monthly_payment, dec!(1378.24));
        assert_eq!(q.total_repayable_amount, dec!(166084.11));
        assert_eq!(q.apr, dec!(11.8));
    }

    #[test]
    fn test_explain_breakdown() {
        let request = validation::validate(&body(json!(120), json!(27.6))).unwrap();
        let terms = coercion::coerce(&request);
        let out = explain(&terms).unwrap();
        let b = &out.result;

        assert_eq!(b.maturity_months, 120);
        assert_eq!(b.monthly_payment_day, 27);
        assert_eq!(b.periodic_rate, dec!(0.009125));
        assert_eq!(b.total_administration_fees, dec!(4800));
        // 1338.242563... × 120 − 97350
        assert!((b.total_interest - dec!(63239.1076)).abs() < dec!(0.0001));
        assert_eq!(b.quote, price(&terms).unwrap());
        // Effective annual rate compounds the monthly APR rate.
        assert!(b.effective_annual_rate > b.quote.apr);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_explain_warns_on_heavy_conclusion_fee() {
        let mut input = body(json!(12), json!(27));
        input["conclusionFee"] = json!(20000);
        let terms = coercion::coerce(&validation::validate(&input).unwrap());
        let out = explain(&terms).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }
}
