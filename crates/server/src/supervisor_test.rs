//! Tests for the listener supervisor
//!
//! These run real sockets on ephemeral loopback ports.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};

use siphon_config::{
    Config, ConfigStore, DeviceConfig, Framing, ListenerConfig, Protocol,
};
use siphon_modules::ModuleRegistry;
use siphon_store::{LogQuery, LogStore};

use crate::error::ServerError;
use crate::pipeline::Pipeline;
use crate::stats::ServerStats;
use crate::supervisor::Supervisor;

async fn test_supervisor() -> Supervisor {
    let mut config = Config::default();
    config.devices.push(DeviceConfig {
        id: "device-1".into(),
        name: "loopback".into(),
        device_type: "generic".into(),
        listener_id: "listener-1".into(),
        ip_addresses: vec!["127.0.0.1".into()],
        description: String::new(),
    });

    let store = Arc::new(LogStore::open_memory().await.unwrap());
    let config = Arc::new(ConfigStore::with_config("supervisor-test-config.json", config));
    let registry = Arc::new(ModuleRegistry::new());
    let stats = Arc::new(ServerStats::new());

    Supervisor::new(Arc::new(Pipeline::new(store, config, registry, stats)))
}

fn listener(id: &str, protocol: Protocol, port: u16, framing: Framing) -> ListenerConfig {
    ListenerConfig {
        id: id.to_string(),
        name: format!("test {}", id),
        enabled: true,
        protocol,
        port,
        framing,
        ..Default::default()
    }
}

async fn free_udp_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap().port()
}

async fn free_tcp_port() -> u16 {
    let socket = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap().port()
}

/// Poll the store until `count` rows exist or the timeout passes.
async fn wait_for_rows(supervisor: &Supervisor, count: usize) -> usize {
    let store = supervisor_store(supervisor);
    for _ in 0..200 {
        let rows = store.get_logs(&LogQuery::latest(100)).await.unwrap().len();
        if rows >= count {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    store.get_logs(&LogQuery::latest(100)).await.unwrap().len()
}

fn supervisor_store(supervisor: &Supervisor) -> Arc<LogStore> {
    Arc::clone(supervisor_pipeline(supervisor).store())
}

fn supervisor_pipeline(supervisor: &Supervisor) -> &Arc<Pipeline> {
    supervisor.pipeline()
}

#[tokio::test]
async fn test_udp_lifecycle_and_ingest() {
    let supervisor = test_supervisor().await;
    let port = free_udp_port().await;

    supervisor
        .start(&listener("listener-1", Protocol::Udp, port, Framing::NonTransparent))
        .await
        .unwrap();
    assert!(supervisor.is_running("listener-1"));

    // Port is occupied while running.
    assert!(!Supervisor::is_port_available(Protocol::Udp, port).await);

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(
            b"<34>1 2024-01-01T00:00:00Z host app - - - hello",
            ("127.0.0.1", port),
        )
        .await
        .unwrap();

    assert_eq!(wait_for_rows(&supervisor, 1).await, 1);

    // Stop, then send again: no further rows appear.
    supervisor.stop("listener-1").await.unwrap();
    assert!(!supervisor.is_running("listener-1"));

    sender
        .send_to(b"<34>1 - host app - - - after stop", ("127.0.0.1", port))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let store = supervisor_store(&supervisor);
    assert_eq!(store.get_logs(&LogQuery::latest(100)).await.unwrap().len(), 1);

    // Port is free again.
    assert!(Supervisor::is_port_available(Protocol::Udp, port).await);
}

#[tokio::test]
async fn test_tcp_line_framing_ingest() {
    let supervisor = test_supervisor().await;
    let port = free_tcp_port().await;

    supervisor
        .start(&listener("listener-1", Protocol::Tcp, port, Framing::NonTransparent))
        .await
        .unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(b"<13>1 2024-01-01T00:00:00Z h a - - - one\n<13>1 2024-01-01T00:00:01Z h a - - - two\r\n")
        .await
        .unwrap();
    stream.flush().await.unwrap();
    drop(stream);

    assert_eq!(wait_for_rows(&supervisor, 2).await, 2);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_tcp_octet_counting_preserves_order() {
    let supervisor = test_supervisor().await;
    let port = free_tcp_port().await;

    supervisor
        .start(&listener("listener-1", Protocol::Tcp, port, Framing::OctetCounting))
        .await
        .unwrap();

    let first = "<13>1 2024-01-01T00:00:00Z h a - - - first";
    let second = "<13>1 2024-01-01T00:00:01Z h a - - - second";
    let payload = format!("{} {}{} {}", first.len(), first, second.len(), second);

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(payload.as_bytes()).await.unwrap();
    stream.flush().await.unwrap();
    drop(stream);

    assert_eq!(wait_for_rows(&supervisor, 2).await, 2);

    let store = supervisor_store(&supervisor);
    let logs = store.get_logs(&LogQuery::latest(10)).await.unwrap();
    // Newest first: "second" then "first".
    assert_eq!(logs[0].message, "second");
    assert_eq!(logs[1].message, "first");

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_octet_truncated_frame_inserts_nothing() {
    let supervisor = test_supervisor().await;
    let port = free_tcp_port().await;

    supervisor
        .start(&listener("listener-1", Protocol::Tcp, port, Framing::OctetCounting))
        .await
        .unwrap();

    // Declares 55 bytes but sends fewer, then closes.
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(b"55 <13>1 short").await.unwrap();
    stream.flush().await.unwrap();
    drop(stream);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let store = supervisor_store(&supervisor);
    assert!(store.get_logs(&LogQuery::latest(10)).await.unwrap().is_empty());

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_start_is_rejected() {
    let supervisor = test_supervisor().await;
    let port = free_udp_port().await;
    let config = listener("listener-1", Protocol::Udp, port, Framing::NonTransparent);

    supervisor.start(&config).await.unwrap();

    match supervisor.start(&config).await {
        Err(ServerError::AlreadyRunning(id)) => assert_eq!(id, "listener-1"),
        other => panic!("expected AlreadyRunning, got {:?}", other.err()),
    }

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_port_conflict_between_listeners() {
    let supervisor = test_supervisor().await;
    let port = free_tcp_port().await;

    supervisor
        .start(&listener("listener-1", Protocol::Tcp, port, Framing::NonTransparent))
        .await
        .unwrap();

    match supervisor
        .start(&listener("listener-2", Protocol::Tcp, port, Framing::NonTransparent))
        .await
    {
        Err(ServerError::PortInUse { port: p, .. }) => assert_eq!(p, port),
        other => panic!("expected PortInUse, got {:?}", other.err()),
    }

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let supervisor = test_supervisor().await;

    // Unknown id: quiet no-op.
    supervisor.stop("never-started").await.unwrap();

    let port = free_udp_port().await;
    supervisor
        .start(&listener("listener-1", Protocol::Udp, port, Framing::NonTransparent))
        .await
        .unwrap();

    supervisor.stop("listener-1").await.unwrap();
    supervisor.stop("listener-1").await.unwrap();
}

#[tokio::test]
async fn test_start_all_continues_past_failures() {
    let supervisor = test_supervisor().await;
    let port_a = free_udp_port().await;
    let port_b = free_tcp_port().await;

    let listeners = vec![
        listener("listener-1", Protocol::Udp, port_a, Framing::NonTransparent),
        // Same port as listener-1: fails, but start_all continues.
        listener("listener-2", Protocol::Udp, port_a, Framing::NonTransparent),
        listener("listener-3", Protocol::Tcp, port_b, Framing::NonTransparent),
        // Disabled: never started.
        ListenerConfig {
            enabled: false,
            ..listener("listener-4", Protocol::Tcp, port_b, Framing::NonTransparent)
        },
    ];

    supervisor.start_all(&listeners).await;

    let running = supervisor.running();
    assert!(running.contains_key("listener-1"));
    assert!(!running.contains_key("listener-2"));
    assert!(running.contains_key("listener-3"));
    assert!(!running.contains_key("listener-4"));

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_tls_requires_material() {
    let supervisor = test_supervisor().await;
    let port = free_tcp_port().await;

    match supervisor
        .start(&listener("listener-1", Protocol::Tls, port, Framing::OctetCounting))
        .await
    {
        Err(ServerError::MissingTlsMaterial) => {}
        other => panic!("expected MissingTlsMaterial, got {:?}", other.err()),
    }

    assert!(!supervisor.is_running("listener-1"));
}
