use serde_json::Value;

/// Rewrites the writer's repr-style array dialect into strict JSON.
///
/// Single-quoted strings become double-quoted and the bare `None` sentinel
/// becomes `null`. The replacement is textual and applies across the whole
/// segment.
fn clean_info_literal(raw: &str) -> String {
    raw.replace("None", "null").replace('\'', "\"")
}

/// Decodes the info segment into the raw ordered array.
///
/// Anything that does not clean up into a non-empty JSON array is rejected
/// with a reason suitable for a parse diagnostic.
pub fn decode_info_array(raw: &str) -> Result<Vec<Value>, &'static str> {
    let cleaned = clean_info_literal(raw.trim());
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(values)) if !values.is_empty() => Ok(values),
        _ => Err("Could not parse JSON from info"),
    }
}
