pub mod error;
pub mod lending;
pub mod time_value;
pub mod types;

pub use error::LoanQuoteError;
pub use lending::quote::{quote, LoanQuote, QuoteError};
pub use types::*;

/// Standard result type for all loan-quote operations
pub type LoanQuoteResult<T> = Result<T, LoanQuoteError>;
