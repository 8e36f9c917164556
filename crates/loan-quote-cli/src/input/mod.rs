pub mod file;
pub mod stdin;

use serde_json::Value;

/// Raw request document from `--input`, else from piped stdin.
pub fn read_request(path: Option<&str>, purpose: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json_value(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <request.json> or stdin required for {purpose}").into())
    }
}
