//! Month-by-month repayment schedule for a quoted loan.
//!
//! Each row is rounded to cents. Interest accrues on the opening balance at
//! the nominal periodic rate; the final row clears whatever balance remains,
//! so the schedule always ends at exactly zero.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lending::amortization;
use crate::lending::coercion::LoanTerms;
use crate::lending::quote::round_money;
use crate::types::{with_metadata, ComputationOutput, Count, Money};
use crate::LoanQuoteResult;

/// A single installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub period: Count,
    pub due_day: Count,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub administration_fee: Money,
    /// interest + principal + administration_fee
    pub payment: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentSchedule {
    pub installments: Vec<Installment>,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_administration_fees: Money,
    pub conclusion_fee: Money,
    /// Sum of all payments plus the conclusion fee.
    pub total_paid: Money,
}

/// Build the cent-rounded repayment schedule for `terms`.
pub fn build_schedule(terms: &LoanTerms) -> LoanQuoteResult<ComputationOutput<RepaymentSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let amortized = amortization::amortize(
        terms.amount,
        terms.interest_rate,
        terms.maturity_months,
        terms.administration_fee,
        terms.conclusion_fee,
    )?;

    let rate = amortized.periodic_rate;
    let level_installment = round_money(amortized.base_installment);
    let administration_fee = round_money(terms.administration_fee);

    let mut installments: Vec<Installment> = Vec::with_capacity(terms.maturity_months as usize);
    let mut balance = round_money(terms.amount);

    for period in 1..=terms.maturity_months {
        let opening_balance = balance;
        let interest = round_money(opening_balance * rate);
        let principal = if period == terms.maturity_months {
            opening_balance
        } else {
            (level_installment - interest).min(opening_balance)
        };
        let closing_balance = opening_balance - principal;

        installments.push(Installment {
            period,
            due_day: terms.monthly_payment_day,
            opening_balance,
            interest,
            principal,
            administration_fee,
            payment: interest + principal + administration_fee,
            closing_balance,
        });

        balance = closing_balance;
    }

    let total_interest: Money = installments.iter().map(|i| i.interest).sum();
    let total_principal: Money = installments.iter().map(|i| i.principal).sum();
    let total_administration_fees: Money =
        installments.iter().map(|i| i.administration_fee).sum();
    let total_payments: Money = installments.iter().map(|i| i.payment).sum();
    let total_paid = total_payments + round_money(terms.conclusion_fee);

    if let Some(last) = installments.last() {
        let drift = last.payment - (level_installment + administration_fee);
        if !drift.is_zero() {
            warnings.push(format!(
                "Final installment adjusted by {drift} to clear cent rounding"
            ));
        }
    }

    let schedule = RepaymentSchedule {
        installments,
        total_interest,
        total_principal,
        total_administration_fees,
        conclusion_fee: round_money(terms.conclusion_fee),
        total_paid,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annuity repayment schedule, cent-rounded per installment, final installment clears the balance",
        &serde_json::json!({
            "product_type": terms.product_type,
            "currency": terms.currency,
            "amount": terms.amount.to_string(),
            "periodic_rate": rate.to_string(),
            "level_installment": level_installment.to_string(),
            "maturity_months": terms.maturity_months,
        }),
        warnings,
        elapsed,
        schedule,
    ))
}
