//! Consumer loan quotation: request validation, numeric coercion, annuity
//! amortization, APR solving and quote assembly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub mod amortization;
pub mod apr;
pub mod coercion;
pub mod quote;
pub mod validation;

#[cfg(feature = "schedule")]
pub mod schedule;

/// Longest term accepted, in monthly installments (50 years).
pub const MAX_MATURITY_MONTHS: u32 = 600;

/// Highest day-of-month an installment can fall due on.
pub const MAX_PAYMENT_DAY: u32 = 31;

pub(crate) const MONTHS_PER_YEAR: Decimal = dec!(12);
pub(crate) const PERCENT: Decimal = dec!(100);

/// Largest principal or fee accepted, in currency units.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000);

/// Highest nominal annual rate accepted, in percent.
pub const MAX_INTEREST_RATE: Decimal = dec!(1000);
