//! RFC 5424 syslog parsing
//!
//! Parses the IETF syslog format:
//!
//! ```text
//! <PRI>VERSION SP TIMESTAMP SP HOSTNAME SP APP-NAME SP PROCID SP MSGID
//!     SP STRUCTURED-DATA [SP MSG]
//! ```
//!
//! Header fields may be the nil value `-`. Structured data is either `-` or
//! one or more `[SD-ID name="value" ...]` elements; param values use the
//! escapes `\"`, `\\` and `\]`.
//!
//! The parser is best-effort at the tail: a valid header with malformed or
//! absent structured data / MSG still yields a message.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::message::SyslogMessage;
use crate::MAX_PRIORITY;

/// RFC 5424 parse failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing or malformed <PRI>")]
    Priority,

    #[error("priority {0} out of range (max 191)")]
    PriorityRange(u16),

    #[error("missing or malformed version")]
    Version,

    #[error("malformed timestamp '{0}'")]
    Timestamp(String),

    #[error("truncated header at {0}")]
    Header(&'static str),
}

/// Byte cursor over the message text.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    /// Consume up to the next space and return the token. Fails on empty input.
    fn token(&mut self, field: &'static str) -> Result<&'a str, ParseError> {
        if self.rest.is_empty() {
            return Err(ParseError::Header(field));
        }
        match self.rest.find(' ') {
            Some(pos) => {
                let tok = &self.rest[..pos];
                self.rest = &self.rest[pos + 1..];
                Ok(tok)
            }
            None => {
                let tok = self.rest;
                self.rest = "";
                Ok(tok)
            }
        }
    }
}

/// Turn a header token into its field value, mapping nil (`-`) to `None`.
fn nilable(token: &str) -> Option<String> {
    if token == "-" {
        None
    } else {
        Some(token.to_string())
    }
}

/// Parse an RFC 5424 message.
pub fn parse(input: &str) -> Result<SyslogMessage, ParseError> {
    let (priority, rest) = parse_pri(input)?;
    let (version, rest) = parse_version(rest)?;

    let mut cur = Cursor::new(rest);

    let ts_token = cur.token("timestamp")?;
    let timestamp = parse_timestamp(ts_token)?;

    let hostname = nilable(cur.token("hostname")?);
    let appname = nilable(cur.token("appname")?);
    let procid = nilable(cur.token("procid")?);
    let msgid = nilable(cur.token("msgid")?);

    let mut msg = SyslogMessage {
        version,
        timestamp,
        hostname,
        appname,
        procid,
        msgid,
        ..Default::default()
    };
    msg.set_priority(priority);

    // Structured data and MSG are best-effort: a header-complete message
    // with a garbled tail is still accepted.
    let rest = cur.rest;
    if let Some(stripped) = rest.strip_prefix('-') {
        msg.message = strip_msg(stripped);
    } else if rest.starts_with('[') {
        match parse_structured_data(rest) {
            Some((sd, remainder)) => {
                msg.structured_data = sd;
                msg.message = strip_msg(remainder);
            }
            None => {
                msg.message = strip_msg(rest);
            }
        }
    } else if !rest.is_empty() {
        msg.message = strip_msg(rest);
    }

    Ok(msg)
}

/// Parse `<PRI>` and return (priority, remainder).
fn parse_pri(input: &str) -> Result<(u8, &str), ParseError> {
    let inner = input.strip_prefix('<').ok_or(ParseError::Priority)?;
    let end = inner.find('>').ok_or(ParseError::Priority)?;
    if end == 0 || end > 3 {
        return Err(ParseError::Priority);
    }
    let digits = &inner[..end];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::Priority);
    }
    let value: u16 = digits.parse().map_err(|_| ParseError::Priority)?;
    if value > MAX_PRIORITY as u16 {
        return Err(ParseError::PriorityRange(value));
    }
    Ok((value as u8, &inner[end + 1..]))
}

/// Parse the version field (1-3 digits, nonzero) followed by a space.
fn parse_version(input: &str) -> Result<(u16, &str), ParseError> {
    let digits_len = input
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count()
        .min(3);
    if digits_len == 0 {
        return Err(ParseError::Version);
    }
    let version: u16 = input[..digits_len].parse().map_err(|_| ParseError::Version)?;
    if version == 0 {
        return Err(ParseError::Version);
    }
    let rest = input[digits_len..]
        .strip_prefix(' ')
        .ok_or(ParseError::Version)?;
    Ok((version, rest))
}

/// Parse the TIMESTAMP field: nil or RFC 3339.
fn parse_timestamp(token: &str) -> Result<Option<DateTime<Utc>>, ParseError> {
    if token == "-" {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(token)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| ParseError::Timestamp(token.to_string()))
}

/// Strip the leading space separating SD from MSG; empty MSG is `None`.
fn strip_msg(rest: &str) -> Option<String> {
    let msg = rest.strip_prefix(' ').unwrap_or(rest);
    if msg.is_empty() {
        None
    } else {
        Some(msg.to_string())
    }
}

/// Parse one or more `[id k="v" ...]` elements.
///
/// Returns the map and the remaining input after the final `]`, or `None`
/// when the SD block is malformed.
fn parse_structured_data(
    input: &str,
) -> Option<(HashMap<String, HashMap<String, String>>, &str)> {
    let mut sd = HashMap::new();
    let mut rest = input;

    while let Some(body) = rest.strip_prefix('[') {
        let (id, mut inner) = match body.find(|c: char| c == ' ' || c == ']') {
            Some(pos) => (&body[..pos], &body[pos..]),
            None => return None,
        };
        if id.is_empty() {
            return None;
        }

        let mut params = HashMap::new();
        loop {
            if let Some(after) = inner.strip_prefix(']') {
                sd.insert(id.to_string(), params);
                rest = after;
                break;
            }
            inner = inner.strip_prefix(' ')?;

            let eq = inner.find('=')?;
            let name = &inner[..eq];
            let value_start = inner[eq + 1..].strip_prefix('"')?;
            let (value, after_value) = parse_param_value(value_start)?;
            params.insert(name.to_string(), value);
            inner = after_value;
        }

        if !rest.starts_with('[') {
            return Some((sd, rest));
        }
    }

    Some((sd, rest))
}

/// Parse a quoted param value handling `\"`, `\\` and `\]` escapes.
///
/// Returns the unescaped value and the input after the closing quote.
fn parse_param_value(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((value, &input[i + 1..])),
            '\\' => match chars.next() {
                Some((_, escaped @ ('"' | '\\' | ']'))) => value.push(escaped),
                Some((_, other)) => {
                    // Unknown escape: keep both characters, per best-effort.
                    value.push('\\');
                    value.push(other);
                }
                None => return None,
            },
            _ => value.push(c),
        }
    }

    None
}

#[cfg(test)]
#[path = "rfc5424_test.rs"]
mod rfc5424_test;
