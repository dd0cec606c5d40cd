//! Text-to-value conversion for values typed on the command line or the bridge.

use electabuzz_value::{DataType, Value};

/// Convert textual values according to the datapoint's declared type.
///
/// Booleans accept `1`, `true`, `yes` and `on` (anything else is false),
/// integer types parse as integers and every other type parses as a float.
/// A single value stays scalar; several become an array.
pub fn parse_values<S: AsRef<str>>(ty: DataType, raw: &[S]) -> Result<Value, String> {
    let mut values = raw
        .iter()
        .map(|s| parse_one(ty, s.as_ref()))
        .collect::<Result<Vec<Value>, String>>()?;

    match values.len() {
        0 => Err("no value given".to_string()),
        1 => Ok(values.remove(0)),
        _ => Ok(Value::Array(values)),
    }
}

fn parse_one(ty: DataType, raw: &str) -> Result<Value, String> {
    let text = raw.trim();
    if ty == DataType::Bool {
        let truthy = matches!(
            text.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
        return Ok(Value::Bool(truthy));
    }
    if ty.is_integer() {
        if let Ok(v) = text.parse::<i64>() {
            return Ok(Value::I64(v));
        }
        return text
            .parse::<u64>()
            .map(Value::U64)
            .map_err(|err| format!("'{text}': {err}"));
    }
    text.parse::<f64>()
        .map(Value::F64)
        .map_err(|err| format!("'{text}': {err}"))
}
