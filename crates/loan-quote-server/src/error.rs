//! Mapping of quotation failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use loan_quote_core::QuoteError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ServerError {
    /// Body was not parseable JSON.
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error(transparent)]
    Quote(#[from] QuoteError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MalformedBody(_) | ServerError::Quote(QuoteError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::Quote(QuoteError::Computation(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn messages(&self) -> Vec<String> {
        match self {
            ServerError::Quote(QuoteError::Validation(messages)) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "quote computation failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.messages(),
        };
        (status, Json(body)).into_response()
    }
}
