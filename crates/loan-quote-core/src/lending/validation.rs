//! Schema validation of raw loan calculation requests.
//!
//! Turns an untyped JSON document into a typed [`LoanRequest`] or an ordered
//! list of human-readable violations. Fields are visited in declaration order
//! (`maturity, productType, amount, interestRate, monthlyPaymentDay,
//! administrationFee, conclusionFee, currency`); each field contributes at
//! most one message, and every field is visited even after a failure so the
//! message list is complete and deterministic.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::lending::{MAX_AMOUNT, MAX_INTEREST_RATE, MAX_MATURITY_MONTHS, MAX_PAYMENT_DAY};
use crate::types::{Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A loan calculation request that passed schema validation.
///
/// Integral fields still carry whatever fractional part the caller sent;
/// `lending::coercion::coerce` truncates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    /// Number of monthly installments, possibly fractional.
    pub maturity: Decimal,
    /// Opaque product code, e.g. "LOANSE02".
    pub product_type: String,
    /// Principal disbursed.
    pub amount: Money,
    /// Nominal annual rate in percent.
    pub interest_rate: Percent,
    /// Day of month the installment falls due, possibly fractional.
    pub monthly_payment_day: Decimal,
    /// Fee charged with every installment.
    pub administration_fee: Money,
    /// One-time fee charged at origination.
    pub conclusion_fee: Money,
    pub currency: String,
}

/// JSON primitive kinds the schema distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Object,
    String,
    Number,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Object => write!(f, "object"),
            Primitive::String => write!(f, "string"),
            Primitive::Number => write!(f, "number"),
        }
    }
}

/// A single schema violation. `Display` yields the wire message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("should have required property '{0}'")]
    MissingField(&'static str),

    #[error("should be {0}")]
    WrongType(Primitive),

    #[error("should NOT be shorter than {0} characters")]
    TooShort(usize),

    #[error("should be >= {0}")]
    BelowMinimum(Decimal),

    #[error("should be > {0}")]
    NotAboveMinimum(Decimal),

    #[error("should be <= {0}")]
    AboveMaximum(Decimal),
}

/// Numeric constraint attached to a field.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    minimum: Decimal,
    /// `value > minimum` rather than `value >= minimum`
    exclusive: bool,
    maximum: Option<Decimal>,
}

impl Bounds {
    fn above(minimum: Decimal) -> Self {
        Bounds {
            minimum,
            exclusive: true,
            maximum: None,
        }
    }

    fn between(minimum: Decimal, maximum: Decimal) -> Self {
        Bounds {
            minimum,
            exclusive: false,
            maximum: Some(maximum),
        }
    }

    fn at_most(self, maximum: Decimal) -> Self {
        Bounds {
            maximum: Some(maximum),
            ..self
        }
    }

    fn check(&self, value: Decimal) -> Result<(), Violation> {
        if self.exclusive && value <= self.minimum {
            return Err(Violation::NotAboveMinimum(self.minimum));
        }
        if value < self.minimum {
            return Err(Violation::BelowMinimum(self.minimum));
        }
        match self.maximum {
            Some(maximum) if value > maximum => Err(Violation::AboveMaximum(maximum)),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate a raw request document.
///
/// Returns the typed request, or every violation as a wire message in field
/// declaration order. A document that is not a JSON object yields the single
/// message `"should be object"`.
pub fn validate(raw: &Value) -> Result<LoanRequest, Vec<String>> {
    let Some(object) = raw.as_object() else {
        return Err(vec![Violation::WrongType(Primitive::Object).to_string()]);
    };

    let mut reader = FieldReader::new(object);

    let maturity = reader.integer(
        "maturity",
        Bounds::between(Decimal::ONE, Decimal::from(MAX_MATURITY_MONTHS)),
    );
    let product_type = reader.text("productType", 1);
    let amount = reader.number("amount", Bounds::above(Decimal::ZERO).at_most(MAX_AMOUNT));
    let interest_rate = reader.number(
        "interestRate",
        Bounds::between(Decimal::ZERO, MAX_INTEREST_RATE),
    );
    let monthly_payment_day = reader.integer(
        "monthlyPaymentDay",
        Bounds::between(Decimal::ONE, Decimal::from(MAX_PAYMENT_DAY)),
    );
    let administration_fee = reader.number(
        "administrationFee",
        Bounds::between(Decimal::ZERO, MAX_AMOUNT),
    );
    let conclusion_fee = reader.number("conclusionFee", Bounds::between(Decimal::ZERO, MAX_AMOUNT));
    let currency = reader.text("currency", 0);

    let messages = reader.finish();

    match (
        maturity,
        product_type,
        amount,
        interest_rate,
        monthly_payment_day,
        administration_fee,
        conclusion_fee,
        currency,
    ) {
        (
            Some(maturity),
            Some(product_type),
            Some(amount),
            Some(interest_rate),
            Some(monthly_payment_day),
            Some(administration_fee),
            Some(conclusion_fee),
            Some(currency),
        ) if messages.is_empty() => Ok(LoanRequest {
            maturity,
            product_type,
            amount,
            interest_rate,
            monthly_payment_day,
            administration_fee,
            conclusion_fee,
            currency,
        }),
        _ => Err(messages),
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Reads fields off a JSON object, recording one violation per bad field.
struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    messages: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            messages: Vec::new(),
        }
    }

    fn number(&mut self, name: &'static str, bounds: Bounds) -> Option<Decimal> {
        let outcome = self
            .decimal(name)
            .and_then(|value| bounds.check(value).map(|_| value));
        self.record(outcome)
    }

    /// A number whose bounds apply to its integer part; the fraction is kept
    /// for the coercer to drop.
    fn integer(&mut self, name: &'static str, bounds: Bounds) -> Option<Decimal> {
        let outcome = self
            .decimal(name)
            .and_then(|value| bounds.check(value.trunc()).map(|_| value));
        self.record(outcome)
    }

    fn decimal(&self, name: &'static str) -> Result<Decimal, Violation> {
        match self.object.get(name) {
            None => Err(Violation::MissingField(name)),
            Some(Value::Number(n)) => {
                json_number_to_decimal(n).ok_or(Violation::AboveMaximum(Decimal::MAX))
            }
            Some(_) => Err(Violation::WrongType(Primitive::Number)),
        }
    }

    fn text(&mut self, name: &'static str, min_length: usize) -> Option<String> {
        let outcome = match self.object.get(name) {
            None => Err(Violation::MissingField(name)),
            Some(Value::String(s)) if s.chars().count() < min_length => {
                Err(Violation::TooShort(min_length))
            }
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(Violation::WrongType(Primitive::String)),
        };
        self.record(outcome)
    }

    fn record<T>(&mut self, outcome: Result<T, Violation>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(violation) => {
                self.messages.push(violation.to_string());
                None
            }
        }
    }

    fn finish(self) -> Vec<String> {
        self.messages
    }
}

/// Exact decimal value of a JSON number, `None` when it is outside the
/// 96-bit decimal range.
fn json_number_to_decimal(number: &Number) -> Option<Decimal> {
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| number.as_f64().and_then(Decimal::from_f64))
        .map(|value| if value.is_zero() { Decimal::ZERO } else { value })
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

    fn valid_body() -> Value {
        json!({
            "maturity": 120,
            "productType": "LOANSE02",
            "amount": 97350,
            "interestRate": 10.95,
            "monthlyPaymentDay": 27,
            "administrationFee": 40,
            "conclusionFee": 695,
            "currency": "SEK"
        })
    }

    fn without(field: &str) -> Value {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove(field);
        body
    }

    fn with(field: &str, value: Value) -> Value {
        let mut body = valid_body();
        body.as_object_mut().unwrap().insert(field.into(), value);
        body
    }

    fn first_message(body: &Value) -> String {
        validate(body).unwrap_err().remove(0)
    }

    #[test]
    fn test_valid_request_is_typed() {
        let request = validate(&valid_body()).unwrap();
        assert_eq!(request.maturity, dec!(120));
        assert_eq!(request.product_type, "LOANSE02");
        assert_eq!(request.amount, dec!(97350));
        assert_eq!(request.interest_rate, dec!(10.95));
        assert_eq!(request.monthly_payment_day, dec!(27));
        assert_eq!(request.administration_fee, dec!(40));
        assert_eq!(request.conclusion_fee, dec!(695));
        assert_eq!(request.currency, "SEK");
    }

    #[test]
    fn test_fractional_integral_fields_pass_uncoerced() {
        let body = with("maturity", json!(12.1));
        let request = validate(&body).unwrap();
        assert_eq!(request.maturity, dec!(12.1));
    }

    #[test]
    fn test_each_missing_field_reports_required_property() {
        for field in [
            "maturity",
            "productType",
            "amount",
            "interestRate",
            "monthlyPaymentDay",
            "administrationFee",
            "conclusionFee",
            "currency",
        ] {
            assert_eq!(
                first_message(&without(field)),
                format!("should have required property '{field}'"),
                "missing {field}"
            );
        }
    }

    #[test]
    fn test_string_fields_reject_numbers() {
        assert_eq!(first_message(&with("productType", json!(15))), "should be string");
        assert_eq!(first_message(&with("productType", json!(15.5))), "should be string");
        assert_eq!(first_message(&with("currency", json!(27))), "should be string");
    }

    #[test]
    fn test_numeric_fields_reject_strings() {
        for field in [
            "maturity",
            "amount",
            "interestRate",
            "monthlyPaymentDay",
            "administrationFee",
            "conclusionFee",
        ] {
            assert_eq!(
                first_message(&with(field, json!("test"))),
                "should be number",
                "string in {field}"
            );
        }
    }

    #[test]
    fn test_numeric_fields_reject_null_bool_and_array() {
        assert_eq!(first_message(&with("amount", Value::Null)), "should be number");
        assert_eq!(first_message(&with("amount", json!(true))), "should be number");
        assert_eq!(first_message(&with("amount", json!([1]))), "should be number");
    }

    #[test]
    fn test_all_violations_collected_in_field_order() {
        let body = json!({
            "productType": 7,
            "amount": "lots",
            "interestRate": 10.95,
            "monthlyPaymentDay": 27,
            "administrationFee": 40,
            "conclusionFee": 695
        });
        let messages = validate(&body).unwrap_err();
        assert_eq!(
            messages,
            vec![
                "should have required property 'maturity'".to_string(),
                "should be string".to_string(),
                "should be number".to_string(),
                "should have required property 'currency'".to_string(),
            ]
        );
    }

    #[test]
    fn test_presence_checked_before_type_for_later_fields() {
        // Missing earlier field comes first even though a later one is mistyped.
        let mut body = with("currency", json!(27));
        body.as_object_mut().unwrap().remove("amount");
        let messages = validate(&body).unwrap_err();
        assert_eq!(messages[0], "should have required property 'amount'");
        assert_eq!(messages[1], "should be string");
    }

    #[test]
    fn test_non_object_document() {
        assert_eq!(validate(&json!([1, 2])).unwrap_err(), vec!["should be object"]);
        assert_eq!(validate(&json!("loan")).unwrap_err(), vec!["should be object"]);
    }

    #[test]
    fn test_range_rules() {
        assert_eq!(first_message(&with("maturity", json!(0.5))), "should be >= 1");
        assert_eq!(first_message(&with("maturity", json!(601))), "should be <= 600");
        assert_eq!(first_message(&with("productType", json!(""))), "should NOT be shorter than 1 characters");
        assert_eq!(first_message(&with("amount", json!(0))), "should be > 0");
        assert_eq!(first_message(&with("interestRate", json!(-1))), "should be >= 0");
        assert_eq!(first_message(&with("monthlyPaymentDay", json!(32))), "should be <= 31");
        assert_eq!(first_message(&with("monthlyPaymentDay", json!(0))), "should be >= 1");
        assert_eq!(first_message(&with("administrationFee", json!(-0.01))), "should be >= 0");
        assert_eq!(first_message(&with("conclusionFee", json!(-5))), "should be >= 0");
        assert_eq!(
            first_message(&with("amount", json!(2e12))),
            "should be <= 1000000000000"
        );
        assert_eq!(first_message(&with("interestRate", json!(1000.5))), "should be <= 1000");
    }

    #[test]
    fn test_range_boundaries_accepted() {
        assert!(validate(&with("maturity", json!(600))).is_ok());
        assert!(validate(&with("maturity", json!(600.9))).is_ok());
        assert!(validate(&with("maturity", json!(1))).is_ok());
        assert!(validate(&with("monthlyPaymentDay", json!(31.9))).is_ok());
        assert!(validate(&with("interestRate", json!(0))).is_ok());
        assert!(validate(&with("conclusionFee", json!(0))).is_ok());
        assert!(validate(&with("currency", json!(""))).is_ok());
    }

    #[test]
    fn test_number_beyond_decimal_range() {
        assert_eq!(
            first_message(&with("amount", json!(1e300))),
            "should be <= 79228162514264337593543950335"
        );
    }

    #[test]
    fn test_scientific_notation_accepted() {
        let request = validate(&with("amount", json!(1.5e4))).unwrap();
        assert_eq!(request.amount, dec!(15000));
    }

    #[test]
    fn test_violation_messages() {
        assert_eq!(
            Violation::MissingField("amount").to_string(),
            "should have required property 'amount'"
        );
        assert_eq!(Violation::WrongType(Primitive::Number).to_string(), "should be number");
        assert_eq!(Violation::NotAboveMinimum(dec!(0)).to_string(), "should be > 0");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let body = with("channel", json!("web"));
        assert!(validate(&body).is_ok());
    }
}
