//! Parsed-field values
//!
//! Field values extracted by device modules are heterogeneous: counters,
//! addresses, flags, free text. [`FieldValue`] is the closed sum over those
//! shapes. On the wire (JSON side-payload column, API bodies) a value is a
//! bare scalar - the variant is recovered by classification on read.

use std::fmt;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

static MAC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{2}([:-][0-9A-Fa-f]{2}){5}$").unwrap());

/// One parsed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Ip(IpAddr),
    Mac(String),
    Str(String),
}

impl FieldValue {
    /// Classify a captured string into the narrowest variant.
    pub fn classify(s: &str) -> FieldValue {
        if let Ok(n) = s.parse::<i64>() {
            return FieldValue::Int(n);
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            return FieldValue::Ip(ip);
        }
        if MAC.is_match(s) {
            return FieldValue::Mac(s.to_string());
        }
        FieldValue::Str(s.to_string())
    }

    /// Recover a value from its JSON scalar form.
    pub fn from_json(value: &serde_json::Value) -> FieldValue {
        match value {
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Str(n.to_string()),
            },
            serde_json::Value::String(s) => Self::classify(s),
            other => FieldValue::Str(other.to_string()),
        }
    }

    /// The value as display text.
    pub fn as_text(&self) -> String {
        self.to_string()
    }

    /// Borrow the string payload when the value is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) | FieldValue::Mac(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Ip(ip) => write!(f, "{}", ip),
            FieldValue::Mac(s) | FieldValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Int(n) => serializer.serialize_i64(*n),
            FieldValue::Ip(ip) => serializer.serialize_str(&ip.to_string()),
            FieldValue::Mac(s) | FieldValue::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(FieldValue::from_json(&value))
    }
}

#[cfg(test)]
#[path = "fields_test.rs"]
mod fields_test;
