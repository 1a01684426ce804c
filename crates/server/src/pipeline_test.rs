//! Tests for the ingestion pipeline

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use siphon_config::{Config, ConfigStore, DeviceConfig, Protocol};
use siphon_modules::{FieldValue, ModuleRegistry};
use siphon_store::{LogQuery, LogStore};
use siphon_syslog::ParserKind;

use crate::pipeline::{Pipeline, ProcessOutcome};
use crate::stats::ServerStats;

fn generic_device(ip: &str) -> DeviceConfig {
    DeviceConfig {
        id: "device-1".into(),
        name: "test device".into(),
        device_type: "generic".into(),
        listener_id: "listener-1".into(),
        ip_addresses: vec![ip.to_string()],
        description: String::new(),
    }
}

async fn pipeline_with(
    devices: Vec<DeviceConfig>,
    overrides: HashMap<String, u8>,
) -> Arc<Pipeline> {
    let mut config = Config::default();
    config.devices = devices;
    config.severity_overrides = overrides;

    let store = Arc::new(LogStore::open_memory().await.unwrap());
    let config = Arc::new(ConfigStore::with_config("pipeline-test-config.json", config));
    let registry = Arc::new(ModuleRegistry::new());
    let stats = Arc::new(ServerStats::new());

    Arc::new(Pipeline::new(store, config, registry, stats))
}

fn peer(addr: &str) -> SocketAddr {
    addr.parse().unwrap()
}

#[tokio::test]
async fn test_happy_path_stores_one_row() {
    let pipeline = pipeline_with(vec![generic_device("127.0.0.1")], HashMap::new()).await;

    let outcome = pipeline
        .process(
            b"<34>1 2024-01-01T00:00:00Z host app - - - hello",
            peer("127.0.0.1:50000"),
            Protocol::Udp,
            ParserKind::Rfc5424,
        )
        .await;

    assert_eq!(outcome, ProcessOutcome::Stored);

    let logs = pipeline.store().get_logs(&LogQuery::latest(10)).await.unwrap();
    assert_eq!(logs.len(), 1);

    let entry = &logs[0];
    assert_eq!(entry.severity, 2);
    assert_eq!(entry.facility, 4);
    assert_eq!(entry.hostname, "host");
    assert_eq!(entry.message, "hello");
    assert_eq!(entry.device_type, "generic");
    assert_eq!(entry.remote_addr, "127.0.0.1:50000");
    assert_eq!(
        entry.raw_message,
        "<34>1 2024-01-01T00:00:00Z host app - - - hello"
    );

    let stats = pipeline.stats().snapshot();
    assert_eq!(stats.server_total, 1);
    assert_eq!(stats.server_by_rfc.get("RFC5424"), Some(&1));
    assert_eq!(stats.server_by_proto.get("UDP"), Some(&1));
}

#[tokio::test]
async fn test_unknown_peer_is_rejected() {
    // No devices configured at all.
    let pipeline = pipeline_with(Vec::new(), HashMap::new()).await;

    let outcome = pipeline
        .process(
            b"<34>1 2024-01-01T00:00:00Z host app - - - hello",
            peer("127.0.0.1:50000"),
            Protocol::Udp,
            ParserKind::Rfc5424,
        )
        .await;

    assert_eq!(outcome, ProcessOutcome::Unauthorized);
    assert!(pipeline.store().get_logs(&LogQuery::latest(10)).await.unwrap().is_empty());
    assert_eq!(pipeline.stats().snapshot().server_total, 0);
}

#[tokio::test]
async fn test_wrong_ip_is_rejected() {
    let pipeline = pipeline_with(vec![generic_device("10.9.9.9")], HashMap::new()).await;

    let outcome = pipeline
        .process(
            b"<34>1 2024-01-01T00:00:00Z host app - - - hello",
            peer("127.0.0.1:50000"),
            Protocol::Udp,
            ParserKind::Rfc5424,
        )
        .await;

    assert_eq!(outcome, ProcessOutcome::Unauthorized);
}

#[tokio::test]
async fn test_device_without_listener_is_rejected() {
    let mut device = generic_device("127.0.0.1");
    device.listener_id = String::new();
    let pipeline = pipeline_with(vec![device], HashMap::new()).await;

    let outcome = pipeline
        .process(
            b"<34>1 2024-01-01T00:00:00Z host app - - - hello",
            peer("127.0.0.1:50000"),
            Protocol::Udp,
            ParserKind::Rfc5424,
        )
        .await;

    assert_eq!(outcome, ProcessOutcome::Unauthorized);
}

#[tokio::test]
async fn test_generic_device_gets_module_classification() {
    let pipeline = pipeline_with(vec![generic_device("127.0.0.1")], HashMap::new()).await;

    let raw = "CEF:0|Ubiquiti|UniFi Network|9.0|threat|Threat Detected|5|src=203.0.113.9 UNIFIcategory=Security";
    pipeline
        .process(raw.as_bytes(), peer("127.0.0.1:4000"), Protocol::Udp, ParserKind::Rfc5424)
        .await;

    let logs = pipeline.store().get_logs(&LogQuery::latest(1)).await.unwrap();
    let entry = &logs[0];

    assert_eq!(entry.device_type, "ubiquiti");
    assert_eq!(entry.event_type, "threat_detected");
    assert!(matches!(
        entry.parsed_fields.get("src"),
        Some(FieldValue::Ip(_))
    ));
}

#[tokio::test]
async fn test_configured_device_type_is_not_overridden() {
    let mut device = generic_device("127.0.0.1");
    device.device_type = "meraki".to_string();
    let pipeline = pipeline_with(vec![device], HashMap::new()).await;

    // A CEF Ubiquiti line; the configured type must stand.
    let raw = "CEF:0|Ubiquiti|UniFi Network|9.0|t|Threat Detected|5|src=1.1.1.1";
    pipeline
        .process(raw.as_bytes(), peer("127.0.0.1:4000"), Protocol::Tcp, ParserKind::Rfc5424)
        .await;

    let logs = pipeline.store().get_logs(&LogQuery::latest(1)).await.unwrap();
    assert_eq!(logs[0].device_type, "meraki");
    assert!(logs[0].parsed_fields.is_empty());
}

#[tokio::test]
async fn test_severity_override_recomputes_priority() {
    let mut overrides = HashMap::new();
    overrides.insert("login_failure".to_string(), 2u8);
    let pipeline = pipeline_with(vec![generic_device("127.0.0.1")], overrides).await;

    // RFC3164 frame, priority 165 → facility 20, severity 5. The Cisco
    // module classifies it as login_failure, overridden to severity 2.
    let raw = "<165>Sep 12 10:00:00 router1 %SEC_LOGIN-4-LOGIN_FAILED: Login failed [user: bob]";
    pipeline
        .process(raw.as_bytes(), peer("127.0.0.1:4000"), Protocol::Udp, ParserKind::Rfc3164)
        .await;

    let logs = pipeline.store().get_logs(&LogQuery::latest(1)).await.unwrap();
    let entry = &logs[0];

    assert_eq!(entry.event_type, "login_failure");
    assert_eq!(entry.severity, 2);
    assert_eq!(entry.facility, 20);
    assert_eq!(entry.priority, 20 * 8 + 2);
}

#[tokio::test]
async fn test_raw_fallback_still_authorized_and_stored() {
    let pipeline = pipeline_with(vec![generic_device("127.0.0.1")], HashMap::new()).await;

    let outcome = pipeline
        .process(
            b"completely unstructured line",
            peer("127.0.0.1:4000"),
            Protocol::Tcp,
            ParserKind::Rfc5424,
        )
        .await;

    assert_eq!(outcome, ProcessOutcome::Stored);

    let logs = pipeline.store().get_logs(&LogQuery::latest(1)).await.unwrap();
    assert_eq!(logs[0].severity, 6);
    assert_eq!(logs[0].facility, 20);
    assert_eq!(logs[0].priority, 165);

    let stats = pipeline.stats().snapshot();
    assert_eq!(stats.server_by_rfc.get("UNKNOWN"), Some(&1));
}

#[tokio::test]
async fn test_trailing_newline_trimmed_from_raw() {
    let pipeline = pipeline_with(vec![generic_device("127.0.0.1")], HashMap::new()).await;

    pipeline
        .process(
            b"<34>1 2024-01-01T00:00:00Z host app - - - hello\n",
            peer("127.0.0.1:4000"),
            Protocol::Udp,
            ParserKind::Rfc5424,
        )
        .await;

    let logs = pipeline.store().get_logs(&LogQuery::latest(1)).await.unwrap();
    assert!(!logs[0].raw_message.ends_with('\n'));
}
