//! Tests for the module registry

use std::collections::HashMap;

use chrono::Utc;

use crate::registry::ModuleRegistry;
use crate::{DeviceModule, DisplayInfo, ModuleMetadata, ParsedLog};

/// Minimal module matching a fixed substring, for ordering tests.
struct KeywordModule {
    name: &'static str,
    keyword: &'static str,
}

impl DeviceModule for KeywordModule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self, raw: &str) -> bool {
        raw.contains(self.keyword)
    }

    fn event_type(&self, _raw: &str) -> String {
        format!("{}_event", self.name)
    }

    fn parse(&self, raw: &str, mut entry: ParsedLog) -> ParsedLog {
        entry.device_type = self.name.to_string();
        entry.event_type = self.event_type(raw);
        entry
    }

    fn display_info(&self, entry: &ParsedLog) -> DisplayInfo {
        DisplayInfo {
            icon: "x".into(),
            color: "#000".into(),
            title: self.name.to_string(),
            description: entry.raw_message.clone(),
            badges: Vec::new(),
            details: Vec::new(),
        }
    }

    fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata {
            device_type: self.name,
            device_name: self.name,
            description: "test module",
            event_types: Vec::new(),
            common_fields: Vec::new(),
            filter_suggestions: Vec::new(),
        }
    }
}

fn two_module_registry() -> ModuleRegistry {
    ModuleRegistry::with_modules(vec![
        Box::new(KeywordModule { name: "alpha", keyword: "AAA" }),
        Box::new(KeywordModule { name: "beta", keyword: "BBB" }),
    ])
}

#[test]
fn test_first_match_wins_in_registration_order() {
    let registry = two_module_registry();
    // Both keywords present: alpha registered first, alpha wins.
    let parsed = registry.parse_log("AAA BBB", Utc::now(), 6, 134);
    assert_eq!(parsed.device_type, "alpha");
}

#[test]
fn test_unknown_when_nothing_matches() {
    let registry = two_module_registry();
    let parsed = registry.parse_log("CCC", Utc::now(), 5, 165);

    assert_eq!(parsed.device_type, "unknown");
    assert_eq!(parsed.event_type, "unknown");
    assert!(parsed.fields.is_empty());
    assert_eq!(parsed.severity, "Notice");
    assert_eq!(parsed.priority, 165);
}

#[test]
fn test_disabled_module_is_skipped() {
    let registry = two_module_registry();

    let mut flags = HashMap::new();
    flags.insert("alpha".to_string(), false);
    registry.set_enabled_modules(&flags);

    // alpha would match first but is disabled; beta takes it.
    let parsed = registry.parse_log("AAA BBB", Utc::now(), 6, 134);
    assert_eq!(parsed.device_type, "beta");

    // Nothing else matches AAA alone now.
    let parsed = registry.parse_log("AAA", Utc::now(), 6, 134);
    assert_eq!(parsed.device_type, "unknown");
}

#[test]
fn test_reenable_module() {
    let registry = two_module_registry();

    let mut flags = HashMap::new();
    flags.insert("alpha".to_string(), false);
    registry.set_enabled_modules(&flags);
    assert!(!registry.is_enabled("alpha"));

    flags.insert("alpha".to_string(), true);
    registry.set_enabled_modules(&flags);
    assert!(registry.is_enabled("alpha"));

    let parsed = registry.parse_log("AAA", Utc::now(), 6, 134);
    assert_eq!(parsed.device_type, "alpha");
}

#[test]
fn test_partial_flag_update_keeps_others() {
    let registry = two_module_registry();

    let mut flags = HashMap::new();
    flags.insert("beta".to_string(), false);
    registry.set_enabled_modules(&flags);

    let enabled = registry.enabled_modules();
    assert_eq!(enabled.get("alpha"), Some(&true));
    assert_eq!(enabled.get("beta"), Some(&false));
}

#[test]
fn test_unregistered_name_defaults_enabled() {
    let registry = two_module_registry();
    assert!(registry.is_enabled("gamma"));
}

#[test]
fn test_display_info_fallback() {
    let registry = two_module_registry();
    let parsed = registry.parse_log("CCC raw text", Utc::now(), 6, 134);
    let info = registry.display_info(&parsed);

    assert_eq!(info.title, "Log Entry");
    assert_eq!(info.description, "CCC raw text");
}

#[test]
fn test_device_types_listing() {
    let registry = two_module_registry();
    let types = registry.device_types();

    assert_eq!(types.len(), 2);
    assert_eq!(types[0].id, "alpha");
    assert_eq!(types[0].name, "Alpha");
    assert!(types[0].enabled);
}

#[test]
fn test_default_registry_detection_priority() {
    let registry = ModuleRegistry::new();

    // A CEF Ubiquiti line also contains the word "firewall" keywords Meraki
    // looks for; Ubiquiti must win by registration order.
    let raw = "CEF:0|Ubiquiti|UniFi Network|9.0|fw|Blocked by Firewall|4|src=10.0.0.1";
    let parsed = registry.parse_log(raw, Utc::now(), 4, 132);
    assert_eq!(parsed.device_type, "ubiquiti");

    // Cisco IOS marker beats Meraki keyword matching.
    let raw = "%LINK-3-UPDOWN: Interface Gi0/1, changed state to up";
    let parsed = registry.parse_log(raw, Utc::now(), 3, 187);
    assert_eq!(parsed.device_type, "cisco");
}

#[test]
fn test_all_metadata() {
    let registry = ModuleRegistry::new();
    let meta = registry.all_metadata();

    assert!(meta.contains_key("ubiquiti"));
    assert!(meta.contains_key("cisco"));
    assert!(meta.contains_key("meraki"));
}
