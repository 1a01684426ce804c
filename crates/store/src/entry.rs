//! Stored log entry

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use siphon_modules::FieldValue;
use siphon_syslog::StructuredData;

/// One ingested message as persisted in the `logs` table.
///
/// Entries are immutable after insertion; the id is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub priority: u8,
    pub facility: u8,
    pub severity: u8,
    pub version: u16,
    pub hostname: String,
    pub appname: String,
    pub procid: String,
    pub msgid: String,
    pub message: String,
    pub structured_data: StructuredData,
    pub raw_message: String,
    /// Peer address in `host:port` form.
    pub remote_addr: String,
    pub device_type: String,
    pub event_type: String,
    pub event_category: String,
    pub parsed_fields: HashMap<String, FieldValue>,
}

impl Default for LogEntry {
    fn default() -> Self {
        Self {
            id: 0,
            timestamp: Utc::now(),
            priority: 0,
            facility: 0,
            severity: 0,
            version: 0,
            hostname: String::new(),
            appname: String::new(),
            procid: String::new(),
            msgid: String::new(),
            message: String::new(),
            structured_data: StructuredData::new(),
            raw_message: String::new(),
            remote_addr: String::new(),
            device_type: String::new(),
            event_type: String::new(),
            event_category: String::new(),
            parsed_fields: HashMap::new(),
        }
    }
}

impl LogEntry {
    /// Human-readable severity name.
    pub fn severity_name(&self) -> &'static str {
        siphon_syslog::severity_name(self.severity)
    }
}
