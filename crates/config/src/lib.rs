//! Siphon Configuration
//!
//! A single JSON document (`config.json`) holds everything an operator can
//! change: the database location and row cap, the legacy default server
//! ports, the web port, parser toggles, and the four runtime tables -
//! listeners, devices, severity overrides, and module enable flags.
//!
//! Missing keys take their defaults, so a minimal (or absent) file just
//! works. Saves rewrite the whole document with indentation; there is no
//! partial update.
//!
//! # Example minimal config
//!
//! ```json
//! {
//!   "database": { "path": "siphon.db" },
//!   "web": { "port": 8080 }
//! }
//! ```

mod error;
mod listeners;
mod store;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use error::{ConfigError, Result};
pub use listeners::{DeviceConfig, Framing, ListenerConfig, Protocol};
pub use store::ConfigStore;

pub use siphon_syslog::ParserKind;

/// The whole on-disk configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,

    /// Legacy fixed server section. Used once at startup: when `listeners`
    /// is empty it seeds equivalent listener entries.
    pub servers: ServersConfig,

    pub web: WebConfig,

    pub parsing: ParsingConfig,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<ListenerConfig>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceConfig>,

    /// event_type → overriding severity (0-7), applied after classification.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub severity_overrides: HashMap<String, u8>,

    /// Saved dashboard views. Owned by the UI layer; round-tripped opaquely.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub views: serde_json::Value,

    /// Brand customization. Owned by the UI layer; round-tripped opaquely.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub customization: serde_json::Value,

    /// device_type → enabled flag for parser modules.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub enabled_modules: HashMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    /// Row cap for the logs table; 0 = unlimited.
    pub limit: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "siphon.db".to_string(),
            limit: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServersConfig {
    pub udp: ServerEndpoint,
    pub tcp: ServerEndpoint,
    pub tls: TlsEndpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEndpoint {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 514,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsEndpoint {
    pub enabled: bool,
    pub port: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert_file: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key_file: String,
}

impl Default for TlsEndpoint {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 6514,
            cert_file: String::new(),
            key_file: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    pub best_effort: bool,
    pub rfc3164_enabled: bool,
    pub rfc5424_enabled: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            best_effort: true,
            rfc3164_enabled: true,
            rfc5424_enabled: true,
        }
    }
}

impl Config {
    /// Seed listener entries from the legacy `servers` section.
    ///
    /// Returns the listeners a fresh install should run: UDP and TCP on
    /// their configured ports when enabled, TLS only when certificate
    /// material is configured.
    pub fn listeners_from_servers(&self) -> Vec<ListenerConfig> {
        let mut seeded = Vec::new();

        if self.servers.udp.enabled {
            seeded.push(ListenerConfig {
                id: "default-udp".to_string(),
                name: "Default UDP".to_string(),
                enabled: true,
                protocol: Protocol::Udp,
                port: self.servers.udp.port,
                ..Default::default()
            });
        }

        if self.servers.tcp.enabled {
            seeded.push(ListenerConfig {
                id: "default-tcp".to_string(),
                name: "Default TCP".to_string(),
                enabled: true,
                protocol: Protocol::Tcp,
                port: self.servers.tcp.port,
                ..Default::default()
            });
        }

        if self.servers.tls.enabled
            && !self.servers.tls.cert_file.is_empty()
            && !self.servers.tls.key_file.is_empty()
        {
            seeded.push(ListenerConfig {
                id: "default-tls".to_string(),
                name: "Default TLS".to_string(),
                enabled: true,
                protocol: Protocol::Tls,
                port: self.servers.tls.port,
                framing: Framing::OctetCounting,
                cert_file: self.servers.tls.cert_file.clone(),
                key_file: self.servers.tls.key_file.clone(),
                ..Default::default()
            });
        }

        seeded
    }
}
