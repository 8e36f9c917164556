//! Annual percentage rate implied by a loan's cash flows.
//!
//! Finds the periodic rate `i` solving
//!
//! ```text
//! amount − conclusion_fee = Σ_{k=1..n} monthly_payment / (1 + i)^k
//! ```
//!
//! The borrower receives the principal net of the upfront fee but repays the
//! full installment, administration fee included. Present value is strictly
//! decreasing in `i`, so the root is unique. The solver runs Newton-Raphson
//! from the nominal periodic rate and keeps a sign-changing bracket, falling
//! back to bisection whenever a Newton step leaves it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::LoanQuoteError;
use crate::lending::{MONTHS_PER_YEAR, PERCENT};
use crate::time_value;
use crate::types::{Count, Money, Percent, Rate};
use crate::LoanQuoteResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_APR_ITERATIONS: u32 = 100;
/// Residual accepted as converged, as a fraction of the net disbursement.
const RELATIVE_TOLERANCE: Decimal = dec!(0.000000000001);
/// Tolerance floor, well above rounding noise at the finest decimal scale.
const MIN_TOLERANCE: Decimal = dec!(0.0000000000000000000000001);
/// Initial upper end of the search bracket: 1000% per period.
const INITIAL_PERIODIC_RATE_CAP: Rate = dec!(10);
/// Times the upper end may double before the root is declared out of reach.
const MAX_BRACKET_DOUBLINGS: u32 = 64;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve for the APR, as an annual percentage (`i × 12 × 100`), unrounded.
pub fn solve_apr(
    amount: Money,
    monthly_payment: Money,
    maturity_months: Count,
    conclusion_fee: Money,
    initial_guess: Rate,
) -> LoanQuoteResult<Percent> {
    let periodic = solve_periodic_rate(
        amount - conclusion_fee,
        monthly_payment,
        maturity_months,
        initial_guess,
    )?;
    Ok(periodic * MONTHS_PER_YEAR * PERCENT)
}

/// Periodic rate at which `maturity_months` payments of `monthly_payment`
/// are worth `net_disbursement` today.
pub fn solve_periodic_rate(
    net_disbursement: Money,
    monthly_payment: Money,
    maturity_months: Count,
    initial_guess: Rate,
) -> LoanQuoteResult<Rate> {
    if maturity_months == 0 {
        return Err(LoanQuoteError::invalid(
            "maturity",
            "APR requires at least one installment",
        ));
    }
    if net_disbursement <= Decimal::ZERO {
        return Err(LoanQuoteError::FinancialImpossibility(format!(
            "net disbursement {net_disbursement} is not positive; fees consume the principal"
        )));
    }

    let residual_at = |rate: Rate| -> (Decimal, Decimal) {
        let (pv, slope) = present_value_and_slope(rate, maturity_months, monthly_payment);
        (pv - net_disbursement, slope)
    };

    let tolerance = (net_disbursement * RELATIVE_TOLERANCE).max(MIN_TOLERANCE);
    let mut lo = Decimal::ZERO;
    let mut hi = INITIAL_PERIODIC_RATE_CAP;

    let residual_lo = time_value::annuity_pv(lo, maturity_months, monthly_payment)? - net_disbursement;
    if residual_lo.abs() < tolerance {
        return Ok(Decimal::ZERO);
    }
    if residual_lo < Decimal::ZERO {
        return Err(LoanQuoteError::FinancialImpossibility(format!(
            "installments total {} which does not repay the net disbursement {net_disbursement}",
            monthly_payment * Decimal::from(maturity_months)
        )));
    }

    // Widen until present value at `hi` drops below the disbursement. The
    // old upper end still has a positive residual, so it becomes `lo`.
    let mut residual_hi = time_value::annuity_pv(hi, maturity_months, monthly_payment)? - net_disbursement;
    let mut doublings = 0;
    while residual_hi > Decimal::ZERO {
        if doublings == MAX_BRACKET_DOUBLINGS {
            return Err(LoanQuoteError::ConvergenceFailure {
                function: "APR".into(),
                iterations: doublings,
                last_delta: residual_hi,
            });
        }
        lo = hi;
        hi *= dec!(2);
        doublings += 1;
        residual_hi = time_value::annuity_pv(hi, maturity_months, monthly_payment)? - net_disbursement;
    }
    if doublings > 0 {
        debug!(doublings, upper = %hi, "APR bracket widened");
    }

    let mut rate = initial_guess.max(lo).min(hi);
    let mut residual = residual_lo;

    for iteration in 0..MAX_APR_ITERATIONS {
        let (r, slope) = residual_at(rate);
        residual = r;

        if residual.abs() < tolerance {
            debug!(iterations = iteration + 1, periodic_rate = %rate, "APR converged");
            return Ok(rate);
        }

        // Present value falls as the rate rises.
        if residual > Decimal::ZERO {
            lo = rate;
        } else {
            hi = rate;
        }

        let newton = if slope.is_zero() {
            None
        } else {
            Some(rate - residual / slope)
        };

        rate = match newton {
            Some(next) if next > lo && next < hi => next,
            _ => (lo + hi) / dec!(2),
        };
    }

    Err(LoanQuoteError::ConvergenceFailure {
        function: "APR".into(),
        iterations: MAX_APR_ITERATIONS,
        last_delta: residual,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Present value of the installment stream and its derivative in `rate`.
///
/// Discount factors are built by repeated multiplication by `1 / (1 + rate)`,
/// which only shrinks for `rate >= 0`.
fn present_value_and_slope(rate: Rate, nper: Count, payment: Money) -> (Money, Decimal) {
    let v = Decimal::ONE / (Decimal::ONE + rate);
    let mut discount = Decimal::ONE;
    let mut pv = Decimal::ZERO;
    let mut slope = Decimal::ZERO;

    for k in 1..=nper {
        discount *= v;
        if discount.is_zero() {
            break;
        }
        pv += payment * discount;
        // d/di (1 + i)^-k = −k (1 + i)^-(k+1)
        slope -= Decimal::from(k) * payment * discount * v;
    }

    (pv, slope)
}
