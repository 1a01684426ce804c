//! Syslog Parsing and Framing
//!
//! Wire-level support for the syslog protocol family:
//!
//! - **RFC 5424** (IETF syslog) - structured data, versioned header
//! - **RFC 3164** (BSD syslog) - legacy timestamp/hostname/tag header
//! - **Raw fallback** - anything else, with best-effort `<PRI>` recovery
//!
//! # Parsing
//!
//! [`parse_best_effort`] runs the chain RFC5424 → RFC3164 → raw fallback and
//! always produces a message; there is no failure case for a received frame.
//!
//! # Framing
//!
//! Two stream framings are supported for TCP/TLS transports:
//!
//! - Non-transparent (newline-delimited, LF or CRLF) via
//!   [`frame::read_line_frame`]
//! - Octet-counting (RFC 6587 / RFC 5425) via [`frame::read_octet_frame`]
//!
//! UDP is datagram-framed and needs neither.

pub mod frame;
pub mod message;
pub mod parse;
pub mod rfc3164;
pub mod rfc5424;

pub use frame::{read_line_frame, read_octet_frame, FrameError, LineFrame, MAX_FRAME_SIZE};
pub use message::{RfcFormat, StructuredData, SyslogMessage};
pub use parse::{parse_best_effort, ParserKind};

/// Default priority when a message carries no parseable `<PRI>` (local0.notice).
pub const DEFAULT_PRIORITY: u8 = 165;

/// Default facility for unparsed messages (local0).
pub const DEFAULT_FACILITY: u8 = 20;

/// Default severity for unparsed messages (informational).
pub const DEFAULT_SEVERITY: u8 = 6;

/// Highest valid syslog priority value (facility 23, severity 7).
pub const MAX_PRIORITY: u8 = 191;

/// Facility portion of a priority value.
#[inline]
pub fn facility(priority: u8) -> u8 {
    priority / 8
}

/// Severity portion of a priority value.
#[inline]
pub fn severity(priority: u8) -> u8 {
    priority % 8
}

/// Human-readable name for a severity level (0-7).
pub fn severity_name(severity: u8) -> &'static str {
    match severity {
        0 => "Emergency",
        1 => "Alert",
        2 => "Critical",
        3 => "Error",
        4 => "Warning",
        5 => "Notice",
        6 => "Informational",
        7 => "Debug",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_split() {
        assert_eq!(facility(0), 0);
        assert_eq!(severity(0), 0);
        assert_eq!(facility(34), 4);
        assert_eq!(severity(34), 2);
        assert_eq!(facility(191), 23);
        assert_eq!(severity(191), 7);
        assert_eq!(facility(165), 20);
        assert_eq!(severity(165), 5);
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(severity_name(0), "Emergency");
        assert_eq!(severity_name(2), "Critical");
        assert_eq!(severity_name(6), "Informational");
        assert_eq!(severity_name(7), "Debug");
        assert_eq!(severity_name(8), "Unknown");
    }
}
