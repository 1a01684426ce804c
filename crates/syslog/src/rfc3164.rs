//! RFC 3164 (BSD) syslog parsing
//!
//! Parses the legacy format:
//!
//! ```text
//! <PRI>Mmm dd hh:mm:ss HOSTNAME TAG[PID]: CONTENT
//! ```
//!
//! The timestamp carries no year; the current year at receipt is assumed.
//! The TAG/PID part is optional - a message whose content starts without a
//! recognizable tag still parses, with the whole remainder as the message.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use thiserror::Error;

use crate::message::SyslogMessage;
use crate::MAX_PRIORITY;

/// RFC 3164 parse failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing or malformed <PRI>")]
    Priority,

    #[error("priority {0} out of range (max 191)")]
    PriorityRange(u16),

    #[error("malformed BSD timestamp")]
    Timestamp,

    #[error("missing hostname")]
    Hostname,
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse an RFC 3164 message using the current year for the timestamp.
pub fn parse(input: &str) -> Result<SyslogMessage, ParseError> {
    parse_with_year(input, Utc::now().year())
}

/// Parse with an explicit year (the BSD timestamp has none).
pub fn parse_with_year(input: &str, year: i32) -> Result<SyslogMessage, ParseError> {
    let (priority, rest) = parse_pri(input)?;
    let (timestamp, rest) = parse_timestamp(rest, year)?;

    // HOSTNAME is the next space-delimited token.
    let rest = rest.strip_prefix(' ').ok_or(ParseError::Hostname)?;
    let host_end = rest.find(' ').ok_or(ParseError::Hostname)?;
    let hostname = &rest[..host_end];
    if hostname.is_empty() {
        return Err(ParseError::Hostname);
    }
    let content = &rest[host_end + 1..];

    let mut msg = SyslogMessage {
        timestamp: Some(timestamp),
        hostname: Some(hostname.to_string()),
        ..Default::default()
    };
    msg.set_priority(priority);

    // TAG[PID]: content - both parts optional in practice.
    let (appname, procid, message) = split_tag(content);
    msg.appname = appname;
    msg.procid = procid;
    msg.message = message;

    Ok(msg)
}

/// Parse `<PRI>` and return (priority, remainder).
fn parse_pri(input: &str) -> Result<(u8, &str), ParseError> {
    let inner = input.strip_prefix('<').ok_or(ParseError::Priority)?;
    let end = inner.find('>').ok_or(ParseError::Priority)?;
    if end == 0 || end > 3 || !inner[..end].bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Priority);
    }
    let value: u16 = inner[..end].parse().map_err(|_| ParseError::Priority)?;
    if value > MAX_PRIORITY as u16 {
        return Err(ParseError::PriorityRange(value));
    }
    Ok((value as u8, &inner[end + 1..]))
}

/// Parse `Mmm dd hh:mm:ss` (day space-padded for 1-9).
fn parse_timestamp(
    input: &str,
    year: i32,
) -> Result<(chrono::DateTime<Utc>, &str), ParseError> {
    // "Mmm dd hh:mm:ss" is exactly 15 bytes, all ASCII.
    if input.len() < 15 || !input.as_bytes()[..15].is_ascii() {
        return Err(ParseError::Timestamp);
    }
    let (ts, rest) = input.split_at(15);

    let month = MONTHS
        .iter()
        .position(|m| ts.starts_with(m))
        .ok_or(ParseError::Timestamp)? as u32
        + 1;

    let day: u32 = ts[4..6].trim_start().parse().map_err(|_| ParseError::Timestamp)?;
    if ts.as_bytes()[6] != b' ' || ts.as_bytes()[9] != b':' || ts.as_bytes()[12] != b':' {
        return Err(ParseError::Timestamp);
    }
    let hour: u32 = ts[7..9].parse().map_err(|_| ParseError::Timestamp)?;
    let minute: u32 = ts[10..12].parse().map_err(|_| ParseError::Timestamp)?;
    let second: u32 = ts[13..15].parse().map_err(|_| ParseError::Timestamp)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ParseError::Timestamp)?;
    let naive = date
        .and_hms_opt(hour, minute, second)
        .ok_or(ParseError::Timestamp)?;

    Ok((Utc.from_utc_datetime(&naive), rest))
}

/// Split `TAG[PID]: content` into (appname, procid, message).
///
/// A tag is a run of up to 32 alphanumeric/`_`/`-`/`.`/`/` characters ending
/// at `:` or `[`. Anything that does not look like a tag leaves the whole
/// content as the message.
fn split_tag(content: &str) -> (Option<String>, Option<String>, Option<String>) {
    let tag_end = content
        .bytes()
        .position(|b| !(b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/')));

    match tag_end {
        Some(end) if end > 0 && end <= 32 => {
            let tag = &content[..end];
            let rest = &content[end..];

            if let Some(bracketed) = rest.strip_prefix('[') {
                // TAG[PID]: content
                if let Some(close) = bracketed.find(']') {
                    let pid = &bracketed[..close];
                    let after = bracketed[close + 1..]
                        .strip_prefix(':')
                        .map(|s| s.trim_start())
                        .unwrap_or_else(|| bracketed[close + 1..].trim_start());
                    return (
                        Some(tag.to_string()),
                        (!pid.is_empty()).then(|| pid.to_string()),
                        (!after.is_empty()).then(|| after.to_string()),
                    );
                }
            } else if let Some(after) = rest.strip_prefix(':') {
                // TAG: content
                let after = after.trim_start();
                return (
                    Some(tag.to_string()),
                    None,
                    (!after.is_empty()).then(|| after.to_string()),
                );
            }

            // No tag delimiter: the whole content is the message.
            (None, None, (!content.is_empty()).then(|| content.to_string()))
        }
        _ => (None, None, (!content.is_empty()).then(|| content.to_string())),
    }
}

#[cfg(test)]
#[path = "rfc3164_test.rs"]
mod rfc3164_test;
