//! Loosely typed request values.
//!
//! Clients post plain JSON without a schema. Presence is judged by JSON
//! truthiness and values are stored as sent, except `rating`/`price` which
//! are coerced to numbers.

use bson::{Bson, Document};
use serde_json::Value;

/// `null`, `false`, `0`, NaN and `""` are falsy; everything else is truthy.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The value when present and truthy.
pub fn present(v: Option<Value>) -> Option<Value> {
    v.filter(truthy)
}

/// Numeric coercion of a request value. Unparsable input becomes NaN.
pub fn coerce_number(v: &Value) -> f64 {
    match v {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_numeric_str(s),
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [only] => coerce_array_item(only),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

// a one-element array coerces through its text form, where null reads as ""
fn coerce_array_item(v: &Value) -> f64 {
    match v {
        Value::Null => 0.0,
        Value::Bool(_) | Value::Object(_) => f64::NAN,
        other => coerce_number(other),
    }
}

fn parse_numeric_str(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust also accepts "inf"/"nan" spellings; only plain decimal notation counts
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Stored form of a request value. Integers that fit 32 bits become `Int32`,
/// every other number a `Double`.
pub fn to_stored(v: &Value) -> Bson {
    match v {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
            Some(i) => Bson::Int32(i),
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(to_stored).collect()),
        Value::Object(map) => Bson::Document(
            map.iter()
                .map(|(k, v)| (k.clone(), to_stored(v)))
                .collect::<Document>(),
        ),
    }
}

/// Wire form of a stored value.
pub fn to_wire(v: Bson) -> Value {
    v.into_relaxed_extjson()
}
