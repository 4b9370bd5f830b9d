/// JSON helpers shared by the validators
///
/// Payloads arrive as strings; only JSON objects are accepted as entity input.

use serde_json::{Map, Value};

/// Parse a string into a JSON object
///
/// Returns None when the string is not valid JSON or when it decodes to anything
/// other than an object (numbers, arrays, `null`, ...).
pub fn try_parse_object(json_string: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(json_string) {
        Ok(Value::Object(object)) => Some(object),
        Ok(other) => {
            tracing::debug!("JSON payload is not an object: {}", type_name(&other));
            None
        }
        Err(e) => {
            tracing::debug!("JSON payload failed to parse: {}", e);
            None
        }
    }
}

/// Name of a JSON value's type, used in type mismatch reports
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read a JSON number as an integer
///
/// Floats with no fractional part (`1920.0`) count as integers. Values outside
/// the i64 range are refused, never clamped.
pub fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    // whole number too large for i64
    if value.is_u64() {
        return None;
    }
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}
