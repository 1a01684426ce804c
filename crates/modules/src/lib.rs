//! Device Parser Modules
//!
//! Vendor-specific log classification behind a uniform capability set.
//!
//! # Design
//!
//! A [`DeviceModule`] is a pluggable parser for one vendor's message
//! dialect. Modules are registered in a [`ModuleRegistry`] in detection
//! priority order - more specific signatures (a CEF header) are checked
//! before broader ones (vendor keyword matching). The first enabled module
//! whose `detect` fires wins.
//!
//! Modules never fail: a message that matches `detect` but has unknown
//! structure yields an entry with the module's device type and empty fields.
//!
//! # Available modules
//!
//! - **ubiquiti** - UniFi gateways/APs (CEF and device-level logs)
//! - **cisco** - IOS `%FACILITY-SEVERITY-MNEMONIC:` messages
//! - **meraki** - Meraki MX/MS/MR event streams

pub mod cisco;
pub mod fields;
pub mod meraki;
pub mod registry;
pub mod ubiquiti;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub use cisco::CiscoModule;
pub use fields::FieldValue;
pub use meraki::MerakiModule;
pub use registry::{DeviceTypeEntry, ModuleRegistry};
pub use ubiquiti::UbiquitiModule;

/// Classification result for one log message.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedLog {
    pub device_type: String,
    pub event_type: String,
    pub event_category: String,
    pub fields: HashMap<String, FieldValue>,
    pub raw_message: String,
    pub timestamp: DateTime<Utc>,
    /// Severity name (Emergency..Debug), for display surfaces.
    pub severity: String,
    pub priority: u8,
}

impl ParsedLog {
    /// Entry pre-filled with message context, before a module classifies it.
    pub fn new(raw_message: &str, timestamp: DateTime<Utc>, severity: u8, priority: u8) -> Self {
        Self {
            device_type: String::new(),
            event_type: String::new(),
            event_category: String::new(),
            fields: HashMap::new(),
            raw_message: raw_message.to_string(),
            timestamp,
            severity: siphon_syslog::severity_name(severity).to_string(),
            priority,
        }
    }

    /// The no-module-matched result.
    pub fn unknown(raw_message: &str, timestamp: DateTime<Utc>, severity: u8, priority: u8) -> Self {
        let mut entry = Self::new(raw_message, timestamp, severity, priority);
        entry.device_type = "unknown".to_string();
        entry.event_type = "unknown".to_string();
        entry
    }
}

/// UI projection of a classified entry.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayInfo {
    pub icon: String,
    pub color: String,
    pub title: String,
    pub description: String,
    pub badges: Vec<Badge>,
    pub details: Vec<DetailItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Badge {
    pub label: String,
    pub color: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailItem {
    pub label: String,
    pub value: String,
    /// Rendering hint: text, ip, mac, port, url.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl DetailItem {
    pub fn text(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            kind: "text",
        }
    }

    pub fn ip(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            kind: "ip",
        }
    }

    pub fn mac(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            kind: "mac",
        }
    }
}

/// Static module description for UI configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleMetadata {
    pub device_type: &'static str,
    pub device_name: &'static str,
    pub description: &'static str,
    pub event_types: Vec<EventTypeInfo>,
    pub common_fields: Vec<FieldInfo>,
    pub filter_suggestions: Vec<FilterSuggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventTypeInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldInfo {
    pub key: &'static str,
    pub label: &'static str,
    /// Value kind: ip, mac, port, string, number.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterSuggestion {
    pub field: &'static str,
    pub label: &'static str,
    pub options: Vec<&'static str>,
}

/// The capability set every vendor module exports.
pub trait DeviceModule: Send + Sync {
    /// Stable module name, doubling as the device type string.
    fn name(&self) -> &'static str;

    /// Fast content check against the vendor signature.
    fn detect(&self, raw: &str) -> bool;

    /// Classify into a module-specific event name; "unknown" when nothing fires.
    fn event_type(&self, raw: &str) -> String;

    /// Populate device type, event type/category and parsed fields.
    /// Must not fail; unknown structure leaves fields empty.
    fn parse(&self, raw: &str, entry: ParsedLog) -> ParsedLog;

    /// UI-oriented projection, consumed only by the HTTP layer.
    fn display_info(&self, entry: &ParsedLog) -> DisplayInfo;

    /// Static description: event types, field dictionary, filter hints.
    fn metadata(&self) -> ModuleMetadata;
}

static KEY_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)=([^\s'"]+|'[^']*'|"[^"]*")"#).unwrap());

/// Extract `key=value` pairs (values optionally single- or double-quoted).
pub fn extract_key_value_pairs(text: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();
    for caps in KEY_VALUE.captures_iter(text) {
        let key = caps[1].to_string();
        let value = caps[2].trim_matches(|c| c == '\'' || c == '"').to_string();
        result.insert(key, value);
    }
    result
}

/// Color for a severity badge (0-7).
pub(crate) fn severity_badge_color(severity: u8) -> &'static str {
    match severity {
        0 => "#ef4444",
        1 => "#f97316",
        2 => "#f59e0b",
        3 => "#eab308",
        4 => "#84cc16",
        5 => "#22c55e",
        6 => "#10b981",
        _ => "#14b8a6",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_key_value_pairs() {
        let kv = extract_key_value_pairs("type=association radio=1 vap='guest net' ch=\"11\"");
        assert_eq!(kv.get("type").map(String::as_str), Some("association"));
        assert_eq!(kv.get("radio").map(String::as_str), Some("1"));
        assert_eq!(kv.get("vap").map(String::as_str), Some("guest net"));
        assert_eq!(kv.get("ch").map(String::as_str), Some("11"));
    }

    #[test]
    fn test_extract_ignores_plain_words() {
        let kv = extract_key_value_pairs("no pairs in this text");
        assert!(kv.is_empty());
    }
}
