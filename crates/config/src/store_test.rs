//! Tests for the config store

use tempfile::tempdir;

use crate::listeners::{DeviceConfig, ListenerConfig, Protocol};
use crate::store::ConfigStore;
use crate::{Config, ConfigError};

#[test]
fn test_creates_default_file_when_absent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let store = ConfigStore::load_or_create(&path).unwrap();

    assert!(path.exists());
    let snapshot = store.snapshot();
    assert_eq!(snapshot, Config::default());
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let store = ConfigStore::load_or_create(&path).unwrap();
    store
        .mutate(|config| {
            config.web.port = 9999;
            config.listeners.push(ListenerConfig {
                id: "listener-1".into(),
                name: "udp".into(),
                enabled: true,
                protocol: Protocol::Udp,
                port: 5514,
                ..Default::default()
            });
            config.devices.push(DeviceConfig {
                id: "device-1".into(),
                name: "fw".into(),
                device_type: "generic".into(),
                listener_id: "listener-1".into(),
                ip_addresses: vec!["127.0.0.1".into()],
                ..Default::default()
            });
            config.severity_overrides.insert("login_failure".into(), 2);
            config.enabled_modules.insert("meraki".into(), false);
        })
        .unwrap();

    let reloaded = ConfigStore::load_or_create(&path).unwrap();
    assert_eq!(reloaded.snapshot(), store.snapshot());
    assert_eq!(reloaded.listeners().len(), 1);
    assert_eq!(reloaded.devices()[0].ip_addresses, vec!["127.0.0.1"]);
    assert_eq!(reloaded.severity_overrides().get("login_failure"), Some(&2));
    assert_eq!(reloaded.enabled_modules().get("meraki"), Some(&false));
}

#[test]
fn test_malformed_file_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, b"{ not json").unwrap();

    match ConfigStore::load_or_create(&path) {
        Err(ConfigError::Parse(_)) => {}
        other => panic!("expected parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_mutate_returns_closure_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let store = ConfigStore::load_or_create(&path).unwrap();
    let id = store
        .mutate(|config| {
            config.listeners.push(ListenerConfig {
                id: "listener-42".into(),
                ..Default::default()
            });
            config.listeners.last().map(|l| l.id.clone())
        })
        .unwrap();

    assert_eq!(id.as_deref(), Some("listener-42"));
}

#[test]
fn test_snapshots_are_isolated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let store = ConfigStore::load_or_create(&path).unwrap();
    let mut snapshot = store.devices();
    snapshot.push(DeviceConfig::default());

    // Mutating a snapshot does not touch the store.
    assert!(store.devices().is_empty());
}

#[test]
fn test_document_is_indented() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    ConfigStore::load_or_create(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n  \"database\""));
}
