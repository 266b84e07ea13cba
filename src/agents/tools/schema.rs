//! Minimal JSON-schema checks for tool parameters

use serde_json::Value;

/// Check `params` against an object schema.
///
/// Covers what the built-in tools declare: object shape, required keys,
/// primitive `type` (single or list, `null` included) and string `enum`s.
/// Anything else in the schema is accepted as-is.
pub fn validate_parameters(schema: &Value, params: &Value) -> Result<(), String> {
    let object = params
        .as_object()
        .ok_or_else(|| format!("parameters must be an object, got {}", type_name(params)))?;

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(key) {
                return Err(format!("missing required parameter '{}'", key));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in object {
        let Some(property) = properties.get(key) else {
            continue;
        };
        if let Some(expected) = property.get("type") {
            if !matches_type(expected, value) {
                return Err(format!(
                    "parameter '{}' should be {}, got {}",
                    key,
                    describe(expected),
                    type_name(value)
                ));
            }
        }
        if let (Some(allowed), Some(s)) = (property.get("enum").and_then(Value::as_array), value.as_str()) {
            if !allowed.iter().any(|a| a.as_str() == Some(s)) {
                return Err(format!("parameter '{}' has unsupported value '{}'", key, s));
            }
        }
    }

    Ok(())
}

fn matches_type(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(t) => matches_named_type(t, value),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| matches_named_type(t, value)),
        _ => true,
    }
}

fn matches_named_type(name: &str, value: &Value) -> bool {
    match name {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn describe(expected: &Value) -> String {
    match expected {
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.as_str().unwrap_or("any").to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
