use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use loan_quote_core::lending::coercion::{self, LoanTerms};
use loan_quote_core::lending::quote;
use loan_quote_core::lending::schedule;
use loan_quote_core::lending::validation;
use loan_quote_core::QuoteError;

use crate::input;

/// Loan terms given as flags instead of a request document.
///
/// Flags are assembled into the same JSON request the server accepts, so
/// omitted ones are reported exactly as a missing field would be.
#[derive(Args, Default)]
pub struct TermFlags {
    /// Term in months; fractions are truncated
    #[arg(long)]
    pub maturity: Option<Decimal>,

    /// Product code (e.g. LOANSE02)
    #[arg(long)]
    pub product_type: Option<String>,

    /// Principal
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Nominal annual rate in percent (e.g. 10.95)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Day of month installments fall due
    #[arg(long)]
    pub monthly_payment_day: Option<Decimal>,

    /// Fee added to every installment
    #[arg(long)]
    pub administration_fee: Option<Decimal>,

    /// One-off fee charged at signing
    #[arg(long)]
    pub conclusion_fee: Option<Decimal>,

    /// ISO currency code
    #[arg(long)]
    pub currency: Option<String>,
}

/// Arguments for quoting a loan
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Include unrounded intermediates and the effective annual rate
    #[arg(long)]
    pub breakdown: bool,

    #[command(flatten)]
    pub terms: TermFlags,
}

/// Arguments for the repayment schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermFlags,
}

/// Arguments for request validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON request file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub terms: TermFlags,
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = request_from(args.input.as_deref(), &args.terms, "loan quote")?;
    quote_value(&raw, args.breakdown)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = request_from(args.input.as_deref(), &args.terms, "repayment schedule")?;
    schedule_value(&raw)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = request_from(args.input.as_deref(), &args.terms, "request validation")?;
    Ok(validate_value(&raw))
}

/// `--input` file first, then flags, then piped stdin.
fn request_from(
    path: Option<&str>,
    flags: &TermFlags,
    purpose: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    if path.is_none() && !flags.is_empty() {
        return Ok(flags.to_request()?);
    }
    input::read_request(path, purpose)
}

impl TermFlags {
    fn is_empty(&self) -> bool {
        self.to_fields().is_empty()
    }

    fn to_fields(&self) -> Vec<(&'static str, Field<'_>)> {
        let numbers = [
            ("maturity", self.maturity),
            ("amount", self.amount),
            ("interestRate", self.interest_rate),
            ("monthlyPaymentDay", self.monthly_payment_day),
            ("administrationFee", self.administration_fee),
            ("conclusionFee", self.conclusion_fee),
        ];
        let texts = [
            ("productType", self.product_type.as_deref()),
            ("currency", self.currency.as_deref()),
        ];

        numbers
            .into_iter()
            .filter_map(|(name, v)| v.map(|d| (name, Field::Number(d))))
            .chain(
                texts
                    .into_iter()
                    .filter_map(|(name, v)| v.map(|s| (name, Field::Text(s)))),
            )
            .collect()
    }

    /// JSON request with one member per flag given.
    fn to_request(&self) -> Result<Value, serde_json::Error> {
        let mut map = Map::new();
        for (name, field) in self.to_fields() {
            let value = match field {
                // Through the JSON number grammar, as a request body would be.
                Field::Number(d) => serde_json::from_str(&d.to_string())?,
                Field::Text(s) => Value::String(s.to_string()),
            };
            map.insert(name.to_string(), value);
        }
        Ok(Value::Object(map))
    }
}

enum Field<'a> {
    Number(Decimal),
    Text(&'a str),
}

fn quote_value(raw: &Value, breakdown: bool) -> Result<Value, Box<dyn std::error::Error>> {
    if breakdown {
        let terms = terms_from(raw)?;
        let result = quote::explain(&terms)?;
        Ok(serde_json::to_value(result)?)
    } else {
        let result = quote::quote(raw)?;
        Ok(serde_json::to_value(result)?)
    }
}

fn schedule_value(raw: &Value) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = terms_from(raw)?;
    let result = schedule::build_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}

fn validate_value(raw: &Value) -> Value {
    match validation::validate(raw) {
        Ok(_) => json!({ "valid": true, "messages": [] }),
        Err(messages) => json!({ "valid": false, "messages": messages }),
    }
}

fn terms_from(raw: &Value) -> Result<LoanTerms, QuoteError> {
    let request = validation::validate(raw).map_err(QuoteError::Validation)?;
    Ok(coercion::coerce(&request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags() -> TermFlags {
        TermFlags {
            maturity: Some(dec!(12)),
            product_type: Some("LOANSE02".into()),
            amount: Some(dec!(97350)),
            interest_rate: Some(dec!(10.95)),
            monthly_payment_day: Some(dec!(27)),
            administration_fee: Some(dec!(40)),
            conclusion_fee: Some(dec!(695)),
            currency: Some("SEK".into()),
        }
    }

    fn request(maturity: f64) -> Value {
        json!({
            "maturity": maturity,
            "productType": "LOANSE02",
            "amount": 97350,
            "interestRate": 10.95,
            "monthlyPaymentDay": 27,
            "administrationFee": 40,
            "conclusionFee": 695,
            "currency": "SEK"
        })
    }

    #[test]
    fn test_quote_value_is_wire_shaped() {
        let value = quote_value(&request(12.0), false).unwrap();
        assert_eq!(
            value,
            json!({"totalRepayableAmount": 104395.21, "monthlyPayment": 8641.68, "apr": 13.2})
        );
    }

    #[test]
    fn test_breakdown_wraps_quote_in_envelope() {
        let value = quote_value(&request(120.0), true).unwrap();
        assert_eq!(value["result"]["quote"]["monthlyPayment"], 1378.24);
        assert_eq!(value["result"]["maturity_months"], 120);
        assert!(value["methodology"].is_string());
    }

    #[test]
    fn test_quote_reports_validation_messages() {
        let mut raw = request(12.0);
        raw.as_object_mut().unwrap().remove("currency");
        let err = quote_value(&raw, false).unwrap_err();
        assert!(err
            .to_string()
            .contains("should have required property 'currency'"));

        let err = quote_value(&raw, true).unwrap_err();
        assert!(err
            .to_string()
            .contains("should have required property 'currency'"));
    }

    #[test]
    fn test_schedule_value_rows() {
        let value = schedule_value(&request(12.9)).unwrap();
        let rows = value["result"]["installments"].as_array().unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0]["due_day"], 27);
    }

    #[test]
    fn test_flags_build_the_same_request() {
        let from_flags = flags().to_request().unwrap();
        assert_eq!(
            quote_value(&from_flags, false).unwrap(),
            quote_value(&request(12.0), false).unwrap()
        );
    }

    #[test]
    fn test_missing_flag_is_a_missing_field() {
        let partial = TermFlags {
            currency: None,
            ..flags()
        };
        let err = quote_value(&partial.to_request().unwrap(), false).unwrap_err();
        assert!(err
            .to_string()
            .contains("should have required property 'currency'"));
    }

    #[test]
    fn test_no_flags_defers_to_other_sources() {
        assert!(TermFlags::default().is_empty());
        assert!(!flags().is_empty());
    }

    #[test]
    fn test_validate_value() {
        assert_eq!(
            validate_value(&request(12.0)),
            json!({"valid": true, "messages": []})
        );

        let verdict = validate_value(&json!({"maturity": "12"}));
        assert_eq!(verdict["valid"], false);
        assert_eq!(verdict["messages"][0], "should be number");
    }

    #[test]
    fn test_validate_accepts_term_flags() {
        let verdict = run_validate(ValidateArgs {
            input: None,
            terms: flags(),
        })
        .unwrap();
        assert_eq!(verdict, json!({"valid": true, "messages": []}));

        let verdict = run_validate(ValidateArgs {
            input: None,
            terms: TermFlags {
                product_type: None,
                ..flags()
            },
        })
        .unwrap();
        assert_eq!(verdict["valid"], false);
        assert_eq!(
            verdict["messages"][0],
            "should have required property 'productType'"
        );
    }
}
