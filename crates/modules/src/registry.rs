//! Module registry
//!
//! Insertion-ordered list of device modules with per-module enable flags.
//! The order defines detection priority; the default registration puts the
//! most specific signatures first.
//!
//! The enable map is a read-mostly snapshot: dispatch clones an `Arc` under
//! a short read lock, so operator toggles never contend with the ingest
//! path. A toggle may miss at most the message currently in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::{CiscoModule, DeviceModule, DisplayInfo, MerakiModule, ModuleMetadata, ParsedLog, UbiquitiModule};

/// One row of the device-type listing exposed to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceTypeEntry {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

/// Process-wide registry of device modules.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn DeviceModule>>,
    enabled: RwLock<Arc<HashMap<String, bool>>>,
}

impl ModuleRegistry {
    /// Registry with the built-in modules in detection priority order:
    /// Ubiquiti first (specific CEF header), Cisco before Meraki (the IOS
    /// format is unambiguous, Meraki matching is keyword-based).
    pub fn new() -> Self {
        Self::with_modules(vec![
            Box::new(UbiquitiModule),
            Box::new(CiscoModule),
            Box::new(MerakiModule),
        ])
    }

    /// Registry over an explicit module list (tests, embedding).
    pub fn with_modules(modules: Vec<Box<dyn DeviceModule>>) -> Self {
        let enabled: HashMap<String, bool> =
            modules.iter().map(|m| (m.name().to_string(), true)).collect();
        Self {
            modules,
            enabled: RwLock::new(Arc::new(enabled)),
        }
    }

    /// Run detection and parsing over the registered modules.
    ///
    /// The first enabled module whose `detect` fires wins; otherwise the
    /// result carries `device_type = "unknown"`.
    pub fn parse_log(
        &self,
        raw: &str,
        timestamp: DateTime<Utc>,
        severity: u8,
        priority: u8,
    ) -> ParsedLog {
        let enabled = self.enabled_snapshot();

        for module in &self.modules {
            let is_enabled = enabled.get(module.name()).copied().unwrap_or(true);
            if is_enabled && module.detect(raw) {
                let entry = ParsedLog::new(raw, timestamp, severity, priority);
                return module.parse(raw, entry);
            }
        }

        ParsedLog::unknown(raw, timestamp, severity, priority)
    }

    /// Whether a module is enabled; unregistered names default to enabled.
    pub fn is_enabled(&self, device_type: &str) -> bool {
        self.enabled_snapshot()
            .get(device_type)
            .copied()
            .unwrap_or(true)
    }

    /// Current enable flags for every registered module.
    pub fn enabled_modules(&self) -> HashMap<String, bool> {
        let snapshot = self.enabled_snapshot();
        self.modules
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let on = snapshot.get(&name).copied().unwrap_or(true);
                (name, on)
            })
            .collect()
    }

    /// Apply enable flags. Unmentioned modules keep their current state.
    pub fn set_enabled_modules(&self, flags: &HashMap<String, bool>) {
        let mut guard = self.enabled.write();
        let mut next = (**guard).clone();
        for (device_type, on) in flags {
            next.insert(device_type.clone(), *on);
        }
        *guard = Arc::new(next);
    }

    fn enabled_snapshot(&self) -> Arc<HashMap<String, bool>> {
        Arc::clone(&self.enabled.read())
    }

    /// Metadata for one module.
    pub fn metadata(&self, device_type: &str) -> Option<ModuleMetadata> {
        self.modules
            .iter()
            .find(|m| m.name() == device_type)
            .map(|m| m.metadata())
    }

    /// Metadata for all registered modules.
    pub fn all_metadata(&self) -> HashMap<String, ModuleMetadata> {
        self.modules
            .iter()
            .map(|m| (m.name().to_string(), m.metadata()))
            .collect()
    }

    /// Display projection for a classified entry; a neutral card when no
    /// module claims the device type.
    pub fn display_info(&self, entry: &ParsedLog) -> DisplayInfo {
        for module in &self.modules {
            if module.name() == entry.device_type {
                return module.display_info(entry);
            }
        }

        DisplayInfo {
            icon: "fa-file-lines".to_string(),
            color: "#9ca3af".to_string(),
            title: "Log Entry".to_string(),
            description: entry.raw_message.clone(),
            badges: Vec::new(),
            details: Vec::new(),
        }
    }

    /// Device-type listing for configuration UIs.
    pub fn device_types(&self) -> Vec<DeviceTypeEntry> {
        let snapshot = self.enabled_snapshot();
        self.modules
            .iter()
            .map(|m| {
                let id = m.name().to_string();
                let mut name = id.clone();
                if let Some(first) = name.get_mut(..1) {
                    first.make_ascii_uppercase();
                }
                let enabled = snapshot.get(&id).copied().unwrap_or(true);
                DeviceTypeEntry { id, name, enabled }
            })
            .collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
