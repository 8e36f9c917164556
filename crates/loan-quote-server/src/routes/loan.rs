//! Loan quotation endpoint

use axum::{body::Bytes, response::Json, routing::post, Router};
use loan_quote_core::LoanQuote;
use serde_json::Value;

use super::AppState;
use crate::error::ServerError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/loan/calculate", post(calculate_handler))
}

/// POST /v1/loan/calculate
///
/// Reads the body as raw bytes so any `Content-Type` is accepted.
async fn calculate_handler(body: Bytes) -> Result<Json<LoanQuote>, ServerError> {
    let raw: Value = serde_json::from_slice(&body)?;
    let quote = loan_quote_core::quote(&raw)?;

    tracing::info!(
        monthly_payment = %quote.monthly_payment,
        total_repayable_amount = %quote.total_repayable_amount,
        apr = %quote.apr,
        "loan quoted"
    );

    Ok(Json(quote))
}
