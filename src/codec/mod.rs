//! Type codec - converts typed setting values to persisted text and back.
//!
//! The backing store only holds text, so every record carries a [`TypeTag`]
//! telling the codec how to rebuild the native value:
//!
//! | Tag       | Persisted text            | Decoded value        |
//! |-----------|---------------------------|----------------------|
//! | `integer` | decimal digits            | JSON integer         |
//! | `float`   | shortest round-trip float | JSON float           |
//! | `string`  | the string itself         | JSON string          |
//! | `boolean` | `"1"` / `"0"`             | JSON bool            |
//! | `array`   | compact JSON, sorted keys | JSON object or array |
//!
//! Primitive decoding never fails: text that does not parse is coerced the
//! way a loosely typed host would (`"12abc"` is `12`, garbage is `0`).
//! Only `array` decoding can fail.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::DecodeError;

/// How a persisted value must be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Integer,
    Float,
    String,
    Boolean,
    Array,
}

impl TypeTag {
    /// All recognized tags.
    pub const ALL: [TypeTag; 5] = [
        TypeTag::Integer,
        TypeTag::Float,
        TypeTag::String,
        TypeTag::Boolean,
        TypeTag::Array,
    ];

    /// Persisted name of the tag.
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
        }
    }

    /// Lenient lookup: `None` for anything that is not one of the five names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| DecodeError::UnknownType(s.to_string()))
    }
}

/// Classify a value by its native kind.
///
/// Booleans are checked before numbers so `true` never becomes an integer.
pub fn detect_type(value: &Value) -> TypeTag {
    match value {
        Value::Bool(_) => TypeTag::Boolean,
        Value::Object(_) | Value::Array(_) => TypeTag::Array,
        Value::Number(n) if n.is_i64() || n.is_u64() => TypeTag::Integer,
        Value::Number(_) => TypeTag::Float,
        Value::String(_) | Value::Null => TypeTag::String,
    }
}

/// Encode a value as persisted text for the given tag.
///
/// Deterministic: objects serialize with sorted keys, so re-encoding an
/// unchanged value yields byte-identical text.
pub fn encode(value: &Value, tag: TypeTag) -> String {
    match tag {
        TypeTag::Array => value.to_string(),
        TypeTag::Boolean => String::from(if is_truthy(value) { "1" } else { "0" }),
        TypeTag::Integer | TypeTag::Float | TypeTag::String => display(value),
    }
}

/// Decode persisted text for the given tag.
pub fn decode(text: &str, tag: TypeTag) -> Result<Value, DecodeError> {
    let value = match tag {
        TypeTag::Array => serde_json::from_str::<Value>(text)?,
        TypeTag::Integer => coerce_integer(text),
        TypeTag::Float => float_value(coerce_float(text)),
        TypeTag::Boolean => Value::Bool(!text.is_empty() && text != "0"),
        TypeTag::String => Value::String(text.to_string()),
    };
    Ok(value)
}

/// Decode persisted text whose tag is still a raw name from the store.
pub fn decode_tagged(text: &str, tag: &str) -> Result<Value, DecodeError> {
    decode(text, tag.parse()?)
}

/// Round-trip a value through the codec, yielding what a reload would see.
pub fn normalize(value: &Value, tag: TypeTag) -> Result<Value, DecodeError> {
    decode(&encode(value, tag), tag)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        Value::Number(n) => n.to_string(),
        Value::Object(_) | Value::Array(_) => value.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn coerce_integer(text: &str) -> Value {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(u) = text.parse::<u64>() {
        return Value::from(u);
    }
    let f = coerce_float(text);
    // saturating cast
    Value::from(f as i64)
}

fn coerce_float(text: &str) -> f64 {
    let text = text.trim();
    text.parse::<f64>()
        .ok()
        .or_else(|| numeric_prefix(text).parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map_or_else(|| Value::from(0.0), Value::Number)
}

/// Longest leading slice that looks like a decimal number.
fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
        }
        if frac > end + 1 || end > digits_start {
            end = frac;
        }
    }
    if end == digits_start {
        return "";
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }
    &text[..end]
}
