use rust_decimal::Decimal;
use thiserror::Error;

/// Computation errors raised by the quotation engine.
///
/// Request validation problems are not errors of this kind: they are
/// collected as an ordered message list by `lending::validation`.
#[derive(Debug, Error)]
pub enum LoanQuoteError {
    /// A typed argument is outside the domain the engine accepts.
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// The cash flows admit no non-negative effective rate.
    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },
}

impl LoanQuoteError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanQuoteError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
