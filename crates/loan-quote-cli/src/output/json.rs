use serde_json::Value;

/// Pretty-print JSON to stdout; a serialization failure goes to stderr.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("could not render result as JSON: {e}"),
    }
}
