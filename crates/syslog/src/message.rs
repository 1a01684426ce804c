//! Parsed syslog message representation

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 5424 structured data: SD-ID → (param name → param value).
pub type StructuredData = HashMap<String, HashMap<String, String>>;

/// Which RFC grammar a message was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RfcFormat {
    #[serde(rename = "RFC5424")]
    Rfc5424,
    #[serde(rename = "RFC3164")]
    Rfc3164,
    /// Raw fallback - neither grammar matched.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl RfcFormat {
    /// Stable string form used in the store and stats counters.
    pub fn as_str(&self) -> &'static str {
        match self {
            RfcFormat::Rfc5424 => "RFC5424",
            RfcFormat::Rfc3164 => "RFC3164",
            RfcFormat::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RfcFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded syslog message.
///
/// Every field except the priority triple is optional: the parsers run in
/// best-effort mode and nil (`-`) header fields stay `None`. The timestamp is
/// `None` when the message carried none that parsed; callers substitute the
/// receipt time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyslogMessage {
    pub priority: u8,
    pub facility: u8,
    pub severity: u8,
    /// RFC 5424 version field; 0 for RFC 3164 and raw messages.
    pub version: u16,
    pub timestamp: Option<DateTime<Utc>>,
    pub hostname: Option<String>,
    pub appname: Option<String>,
    pub procid: Option<String>,
    pub msgid: Option<String>,
    pub message: Option<String>,
    pub structured_data: StructuredData,
}

impl SyslogMessage {
    /// Set the priority and derive facility/severity from it.
    pub fn set_priority(&mut self, priority: u8) {
        self.priority = priority;
        self.facility = priority / 8;
        self.severity = priority % 8;
    }
}
