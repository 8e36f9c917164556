use serde_json::Value;

/// Keys worth printing on their own, most important first.
const PRIORITY_KEYS: [&str; 5] = [
    "monthlyPayment",
    "apr",
    "totalRepayableAmount",
    "total_paid",
    "valid",
];

/// Print just the headline figure.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

/// Descends through the `result` envelope and a nested `quote`, then takes
/// the first priority key present, else the first field.
fn minimal_text(value: &Value) -> String {
    let mut target = value;
    for wrapper in ["result", "quote"] {
        if let Some(inner) = target.get(wrapper).filter(|v| v.is_object()) {
            target = inner;
        }
    }

    if let Value::Object(map) = target {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return format_minimal(val);
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(target)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
