//! HTTP boundary for the loan quotation engine
//!
//! Exposes `POST /v1/loan/calculate`, which turns a raw JSON request into a
//! quote or a `{statusCode, error, message}` rejection, plus `GET /health`.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use loan_quote_core;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
