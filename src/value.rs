//! Value Serializer Module
//!
//! Turns a native value into script literal text for property initial
//! values. Scalars map to their literal forms, text becomes an escaped
//! single-quoted string, composites go through JSON.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::SerializeError;

/// A value read from the native side of the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// A diagnostic/error object, carried as its description.
    Error(String),
    Array(Vec<NativeValue>),
    /// Keyed collection in native enumeration order.
    Object(Vec<(String, NativeValue)>),
    /// A native object with no structured encoding.
    Opaque(String),
}

/// Serialize one value into a script literal.
pub fn serialize_value(value: &NativeValue) -> Result<String, SerializeError> {
    match value {
        NativeValue::Null => Ok("null".to_string()),
        NativeValue::Error(description) => Ok(quote_js_string(description)),
        NativeValue::Bool(b) => Ok(b.to_string()),
        NativeValue::Int(i) => Ok(i.to_string()),
        NativeValue::Float(f) => Ok(float_literal(*f)),
        NativeValue::String(s) => Ok(quote_js_string(s)),
        NativeValue::Opaque(description) => Err(SerializeError::Opaque(description.clone())),
        NativeValue::Array(_) | NativeValue::Object(_) => {
            serde_json::to_string(value).map_err(|e| classify_json_error(value, e))
        }
    }
}

fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else {
        f.to_string()
    }
}

/// Recover the typed failure that a custom serde error was raised for.
fn classify_json_error(value: &NativeValue, error: serde_json::Error) -> SerializeError {
    match first_unencodable(value) {
        Some(NativeValue::Float(f)) => SerializeError::NonFinite(float_literal(*f)),
        Some(NativeValue::Opaque(description)) => SerializeError::Opaque(description.clone()),
        _ => SerializeError::Json(error.to_string()),
    }
}

fn first_unencodable(value: &NativeValue) -> Option<&NativeValue> {
    match value {
        NativeValue::Float(f) if !f.is_finite() => Some(value),
        NativeValue::Opaque(_) => Some(value),
        NativeValue::Array(items) => items.iter().find_map(first_unencodable),
        NativeValue::Object(entries) => entries.iter().find_map(|(_, v)| first_unencodable(v)),
        _ => None,
    }
}

/// Quote `s` as a single-quoted script string literal.
pub fn quote_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0B}' => out.push_str("\\v"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() && (c as u32) < 0x100 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERDE
// ═══════════════════════════════════════════════════════════════════════════════

impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            NativeValue::Null => serializer.serialize_unit(),
            NativeValue::Bool(b) => serializer.serialize_bool(*b),
            NativeValue::Int(i) => serializer.serialize_i64(*i),
            NativeValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            NativeValue::Float(f) => Err(ser::Error::custom(format!(
                "non-finite number {}",
                float_literal(*f)
            ))),
            NativeValue::String(s) | NativeValue::Error(s) => serializer.serialize_str(s),
            NativeValue::Opaque(description) => Err(ser::Error::custom(format!(
                "opaque value {}",
                description
            ))),
            NativeValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            NativeValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for NativeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NativeValueVisitor)
    }
}

struct NativeValueVisitor;

impl<'de> Visitor<'de> for NativeValueVisitor {
    type Value = NativeValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<NativeValue, E> {
        Ok(NativeValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<NativeValue, E> {
        Ok(NativeValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<NativeValue, D::Error> {
        NativeValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<NativeValue, E> {
        Ok(NativeValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<NativeValue, E> {
        Ok(NativeValue::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<NativeValue, E> {
        Ok(match i64::try_from(u) {
            Ok(i) => NativeValue::Int(i),
            Err(_) => NativeValue::Float(u as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<NativeValue, E> {
        Ok(NativeValue::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<NativeValue, E> {
        Ok(NativeValue::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<NativeValue, E> {
        Ok(NativeValue::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<NativeValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(NativeValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<NativeValue, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, NativeValue>()? {
            entries.push((key, value));
        }
        Ok(NativeValue::Object(entries))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
