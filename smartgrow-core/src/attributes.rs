//! Attribute Values and the Change-Stream Normalizer
//!
//! ## Overview
//!
//! Change-stream images arrive in the store's typed encoding: every value is
//! wrapped in a single-key object whose key is a type tag.
//!
//! ```text
//! { "PK":          { "S": "PLOT#P1" },
//!   "temperature": { "N": "42.5" },
//!   "tags":        { "L": [ { "S": "north" }, { "NULL": true } ] } }
//! ```
//!
//! The normalizer turns that into an [`AttributeMap`] of plain
//! [`AttributeValue`]s. Decoding is strict: an unknown tag, a wrapper with
//! zero or several tags, or a payload of the wrong shape fails the whole
//! image with a [`DecodeError`] naming the attribute path. Nothing is coerced.
//!
//! ## Numbers
//!
//! Numbers keep the exact decimal text they were sent with, so a value like
//! `0.1` never picks up binary floating-point noise while it sits in a map.
//! Conversion to `f64` only happens at comparison time via
//! [`AttributeValue::as_f64`].
//!
//! ## Supported Tags
//!
//! | Tag    | Decodes to                      |
//! |--------|---------------------------------|
//! | `S`    | `String`                        |
//! | `N`    | `Number` (validated)            |
//! | `BOOL` | `Bool`                          |
//! | `NULL` | `Null`                          |
//! | `L`    | `List` (recursively decoded)    |
//! | `M`    | `Map` (recursively decoded)     |
//! | `SS`   | `List` of `String`              |
//! | `NS`   | `List` of `Number`              |
//! | `B`    | `Binary` (base64)               |
//! | `BS`   | `List` of `Binary`              |

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::errors::DecodeError;

/// Plain attribute name → value mapping for one item
pub type AttributeMap = HashMap<String, AttributeValue>;

/// A decoded attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    /// Exact decimal text, validated as a finite number on construction
    Number(String),
    Bool(bool),
    Null,
    Binary(Vec<u8>),
    List(Vec<AttributeValue>),
    Map(AttributeMap),
}

impl AttributeValue {
    /// Build a number from anything with a decimal `Display`
    pub fn number(n: impl ToString) -> Self {
        AttributeValue::Number(n.to_string())
    }

    pub fn string(s: impl Into<String>) -> Self {
        AttributeValue::String(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used for range comparison.
    ///
    /// Numbers and numeric strings convert; everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let text = match self {
            AttributeValue::Number(n) => n.as_str(),
            AttributeValue::String(s) => s.trim(),
            _ => return None,
        };
        text.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Identifier view: non-empty strings as-is, numbers by their decimal text
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) if !s.is_empty() => Some(s.clone()),
            AttributeValue::Number(n) => Some(n.clone()),
            _ => None,
        }
    }

    /// Whether the value carries content.
    ///
    /// `Null`, empty strings, and empty collections count as absent.
    pub fn is_present(&self) -> bool {
        match self {
            AttributeValue::Null => false,
            AttributeValue::String(s) => !s.is_empty(),
            AttributeValue::Binary(b) => !b.is_empty(),
            AttributeValue::List(l) => !l.is_empty(),
            AttributeValue::Map(m) => !m.is_empty(),
            AttributeValue::Number(_) | AttributeValue::Bool(_) => true,
        }
    }
}

/// Return the first present value among `keys`, tried in order
pub fn first_present<'a>(map: &'a AttributeMap, keys: &[&str]) -> Option<&'a AttributeValue> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| value.is_present())
}

/// Plain JSON (fixtures, API payloads) into attribute values
impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(b),
            Value::Number(n) => AttributeValue::Number(n.to_string()),
            Value::String(s) => AttributeValue::String(s),
            Value::Array(items) => {
                AttributeValue::List(items.into_iter().map(AttributeValue::from).collect())
            }
            Value::Object(fields) => AttributeValue::Map(
                fields.into_iter().map(|(k, v)| (k, AttributeValue::from(v))).collect(),
            ),
        }
    }
}

/// Decode a full change-stream image into plain attributes
pub fn normalize_image(
    image: &serde_json::Map<String, Value>,
) -> Result<AttributeMap, DecodeError> {
    image
        .iter()
        .map(|(name, raw)| Ok((name.clone(), decode_value(name, raw)?)))
        .collect()
}

/// Decode one tagged value. `attribute` is the path used in error messages.
pub fn decode_value(attribute: &str, raw: &Value) -> Result<AttributeValue, DecodeError> {
    let wrapper = match raw.as_object() {
        Some(obj) if obj.len() == 1 => obj,
        Some(obj) => {
            return Err(DecodeError::MalformedWrapper {
                attribute: attribute.to_string(),
                found: obj.len(),
            })
        }
        None => {
            return Err(DecodeError::MalformedWrapper {
                attribute: attribute.to_string(),
                found: 0,
            })
        }
    };

    let (tag, payload) = match wrapper.iter().next() {
        Some(entry) => entry,
        None => {
            return Err(DecodeError::MalformedWrapper {
                attribute: attribute.to_string(),
                found: 0,
            })
        }
    };

    match tag.as_str() {
        "S" => Ok(AttributeValue::String(expect_str(attribute, "S", payload)?.to_string())),
        "N" => decode_number(attribute, "N", payload),
        "BOOL" => payload
            .as_bool()
            .map(AttributeValue::Bool)
            .ok_or_else(|| invalid(attribute, "BOOL", "expected a boolean")),
        "NULL" => match payload {
            Value::Bool(true) => Ok(AttributeValue::Null),
            _ => Err(invalid(attribute, "NULL", "expected `true`")),
        },
        "B" => decode_binary(attribute, "B", payload),
        "L" => expect_array(attribute, "L", payload)?
            .iter()
            .enumerate()
            .map(|(i, item)| decode_value(&format!("{}[{}]", attribute, i), item))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::List),
        "M" => {
            let fields = payload
                .as_object()
                .ok_or_else(|| invalid(attribute, "M", "expected an object"))?;
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), decode_value(&format!("{}.{}", attribute, k), v)?)))
                .collect::<Result<AttributeMap, DecodeError>>()
                .map(AttributeValue::Map)
        }
        "SS" => expect_array(attribute, "SS", payload)?
            .iter()
            .map(|item| Ok(AttributeValue::String(expect_str(attribute, "SS", item)?.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::List),
        "NS" => expect_array(attribute, "NS", payload)?
            .iter()
            .map(|item| decode_number(attribute, "NS", item))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::List),
        "BS" => expect_array(attribute, "BS", payload)?
            .iter()
            .map(|item| decode_binary(attribute, "BS", item))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::List),
        other => Err(DecodeError::UnknownTag {
            attribute: attribute.to_string(),
            tag: other.to_string(),
        }),
    }
}

fn decode_number(
    attribute: &str,
    tag: &'static str,
    payload: &Value,
) -> Result<AttributeValue, DecodeError> {
    let text = expect_str(attribute, tag, payload)?.trim();
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(AttributeValue::Number(text.to_string())),
        _ => Err(invalid(attribute, tag, &format!("`{}` is not a finite number", text))),
    }
}

fn decode_binary(
    attribute: &str,
    tag: &'static str,
    payload: &Value,
) -> Result<AttributeValue, DecodeError> {
    let encoded = expect_str(attribute, tag, payload)?;
    STANDARD
        .decode(encoded)
        .map(AttributeValue::Binary)
        .map_err(|e| invalid(attribute, tag, &e.to_string()))
}

fn expect_str<'a>(
    attribute: &str,
    tag: &'static str,
    payload: &'a Value,
) -> Result<&'a str, DecodeError> {
    payload
        .as_str()
        .ok_or_else(|| invalid(attribute, tag, "expected a string"))
}

fn expect_array<'a>(
    attribute: &str,
    tag: &'static str,
    payload: &'a Value,
) -> Result<&'a Vec<Value>, DecodeError> {
    payload
        .as_array()
        .ok_or_else(|| invalid(attribute, tag, "expected an array"))
}

fn invalid(attribute: &str, tag: &'static str, reason: &str) -> DecodeError {
    DecodeError::InvalidPayload {
        attribute: attribute.to_string(),
        tag,
        reason: reason.to_string(),
    }
}
