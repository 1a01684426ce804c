//! Best-effort parse chain
//!
//! Every received frame decodes to exactly one message: RFC 5424 first,
//! RFC 3164 on failure, and finally a raw fallback that recovers `<PRI>`
//! when the frame leads with one and leaves everything else empty.

use serde::{Deserialize, Serialize};

use crate::message::{RfcFormat, SyslogMessage};
use crate::{rfc3164, rfc5424, DEFAULT_FACILITY, DEFAULT_PRIORITY, DEFAULT_SEVERITY, MAX_PRIORITY};

/// Which parser a listener prefers. Kept for listener configuration parity;
/// the chain always runs RFC5424-first regardless, matching the upstream
/// collectors this service replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParserKind {
    #[default]
    #[serde(rename = "RFC5424")]
    Rfc5424,
    #[serde(rename = "RFC3164")]
    Rfc3164,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Rfc5424 => "RFC5424",
            ParserKind::Rfc3164 => "RFC3164",
        }
    }
}

/// Decode a frame, falling through RFC5424 → RFC3164 → raw.
///
/// The raw fallback never fails: it produces a message with default
/// priority/facility/severity (165/20/6) unless the frame starts with a
/// `<PRI>` whose closing bracket sits within the first five bytes and whose
/// value is a valid priority.
pub fn parse_best_effort(data: &[u8]) -> (SyslogMessage, RfcFormat) {
    let text = String::from_utf8_lossy(data);

    if let Ok(msg) = rfc5424::parse(&text) {
        return (msg, RfcFormat::Rfc5424);
    }

    if let Ok(msg) = rfc3164::parse(&text) {
        return (msg, RfcFormat::Rfc3164);
    }

    (raw_fallback(&text), RfcFormat::Unknown)
}

/// Build the raw-fallback message for an unparseable frame.
fn raw_fallback(text: &str) -> SyslogMessage {
    let mut msg = SyslogMessage {
        priority: DEFAULT_PRIORITY,
        facility: DEFAULT_FACILITY,
        severity: DEFAULT_SEVERITY,
        ..Default::default()
    };

    if let Some(pri) = extract_leading_pri(text) {
        msg.set_priority(pri);
    }

    msg
}

/// Extract `<N>` from the head of the frame.
///
/// Only honored when `>` appears at index 1..=4 (at most three digits) and
/// the value is a valid priority; `<1000>...` falls through to defaults.
fn extract_leading_pri(text: &str) -> Option<u8> {
    let inner = text.strip_prefix('<')?;
    let end = inner.find('>')?;
    if end == 0 || end >= 4 {
        return None;
    }
    let value: u16 = inner[..end].parse().ok()?;
    if value > MAX_PRIORITY as u16 {
        return None;
    }
    Some(value as u8)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod parse_test;
