//! Listener and device table entries

use serde::{Deserialize, Serialize};

use siphon_syslog::ParserKind;

/// Transport protocol of a listener endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[default]
    #[serde(rename = "UDP")]
    Udp,
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "TLS")]
    Tls,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
            Protocol::Tls => "TLS",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream framing for TCP listeners. TLS always uses octet-counting
/// (RFC 5425) regardless of this field; UDP ignores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Framing {
    #[default]
    #[serde(rename = "non-transparent")]
    NonTransparent,
    #[serde(rename = "octet-counting")]
    OctetCounting,
}

/// A user-defined network endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub protocol: Protocol,
    pub port: u16,
    pub framing: Framing,
    pub parser: ParserKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert_file: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key_file: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ca_cert_file: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// An authorized sender. A message is accepted only when its peer IP
/// exactly matches one of the addresses of a device whose `listener_id`
/// is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,
    /// A registry module name, or "generic" to let modules classify.
    pub device_type: String,
    pub listener_id: String,
    pub ip_addresses: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl DeviceConfig {
    /// Whether this device authorizes messages from the given peer IP.
    pub fn matches_ip(&self, ip: &str) -> bool {
        !self.listener_id.is_empty() && self.ip_addresses.iter().any(|a| a == ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_wire_form() {
        assert_eq!(serde_json::to_string(&Protocol::Udp).unwrap(), "\"UDP\"");
        assert_eq!(serde_json::to_string(&Protocol::Tls).unwrap(), "\"TLS\"");
        let p: Protocol = serde_json::from_str("\"TCP\"").unwrap();
        assert_eq!(p, Protocol::Tcp);
    }

    #[test]
    fn test_framing_wire_form() {
        assert_eq!(
            serde_json::to_string(&Framing::OctetCounting).unwrap(),
            "\"octet-counting\""
        );
        let f: Framing = serde_json::from_str("\"non-transparent\"").unwrap();
        assert_eq!(f, Framing::NonTransparent);
    }

    #[test]
    fn test_listener_roundtrip() {
        let listener = ListenerConfig {
            id: "listener-1".into(),
            name: "Edge TLS".into(),
            enabled: true,
            protocol: Protocol::Tls,
            port: 6514,
            framing: Framing::OctetCounting,
            parser: ParserKind::Rfc5424,
            cert_file: "certs/server.crt".into(),
            key_file: "certs/server.key".into(),
            ca_cert_file: String::new(),
            description: String::new(),
        };

        let json = serde_json::to_string(&listener).unwrap();
        let back: ListenerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, listener);
        // Empty optional paths are omitted from the document.
        assert!(!json.contains("ca_cert_file"));
    }

    #[test]
    fn test_device_matches_ip() {
        let device = DeviceConfig {
            id: "device-1".into(),
            name: "fw".into(),
            device_type: "generic".into(),
            listener_id: "listener-1".into(),
            ip_addresses: vec!["10.0.0.1".into(), "10.0.0.2".into()],
            description: String::new(),
        };

        assert!(device.matches_ip("10.0.0.1"));
        assert!(device.matches_ip("10.0.0.2"));
        assert!(!device.matches_ip("10.0.0.3"));
    }

    #[test]
    fn test_device_without_listener_never_matches() {
        let device = DeviceConfig {
            ip_addresses: vec!["10.0.0.1".into()],
            ..Default::default()
        };
        assert!(!device.matches_ip("10.0.0.1"));
    }
}
