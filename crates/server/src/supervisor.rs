//! Listener supervisor
//!
//! Owns the map of running listeners. Each entry pairs a cancellation
//! token with the accept loop's join handle, so `stop` can observe the
//! loop actually exiting. The map is guarded by a reader/writer lock:
//! status reads take the read lock, lifecycle changes the write lock.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;

use siphon_config::{ListenerConfig, Protocol};

use crate::error::{Result, ServerError};
use crate::pipeline::Pipeline;
use crate::{tcp, tls, udp};

struct RunningListener {
    kind: Protocol,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Supervisor over the dynamic listener set.
pub struct Supervisor {
    pipeline: Arc<Pipeline>,
    active: RwLock<HashMap<String, RunningListener>>,
}

impl Supervisor {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            active: RwLock::new(HashMap::new()),
        }
    }

    /// The shared ingestion pipeline.
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Whether a listener currently has a live accept loop.
    pub fn is_running(&self, id: &str) -> bool {
        self.active.read().contains_key(id)
    }

    /// Ids and transports of all running listeners.
    pub fn running(&self) -> HashMap<String, Protocol> {
        self.active
            .read()
            .iter()
            .map(|(id, l)| (id.clone(), l.kind))
            .collect()
    }

    /// Probe-and-release port availability check.
    pub async fn is_port_available(protocol: Protocol, port: u16) -> bool {
        let addr: SocketAddr = match format!("0.0.0.0:{}", port).parse() {
            Ok(addr) => addr,
            Err(_) => return false,
        };

        match protocol {
            Protocol::Udp => tokio::net::UdpSocket::bind(addr).await.is_ok(),
            Protocol::Tcp | Protocol::Tls => TcpListener::bind(addr).await.is_ok(),
        }
    }

    /// Start a configured listener.
    ///
    /// Rejects duplicate ids and occupied ports; for TLS, loads the
    /// certificate material before anything binds. On success the accept
    /// loop is running and the stop handle is recorded.
    pub async fn start(&self, listener: &ListenerConfig) -> Result<()> {
        if self.is_running(&listener.id) {
            return Err(ServerError::AlreadyRunning(listener.id.clone()));
        }

        if !Self::is_port_available(listener.protocol, listener.port).await {
            return Err(ServerError::PortInUse {
                protocol: listener.protocol,
                port: listener.port,
            });
        }

        let cancel = CancellationToken::new();
        let handle = match listener.protocol {
            Protocol::Udp => self.spawn_udp(listener, cancel.clone()).await?,
            Protocol::Tcp => self.spawn_tcp(listener, cancel.clone()).await?,
            Protocol::Tls => self.spawn_tls(listener, cancel.clone()).await?,
        };

        self.active.write().insert(
            listener.id.clone(),
            RunningListener {
                kind: listener.protocol,
                cancel,
                handle,
            },
        );

        tracing::info!(
            listener_id = %listener.id,
            name = %listener.name,
            protocol = %listener.protocol,
            port = listener.port,
            "listener started"
        );

        Ok(())
    }

    /// Stop a running listener and wait for its accept loop to drain.
    /// Stopping an unknown id is a no-op.
    pub async fn stop(&self, id: &str) -> Result<()> {
        let Some(listener) = self.active.write().remove(id) else {
            tracing::debug!(listener_id = %id, "stop: listener not running");
            return Ok(());
        };

        listener.cancel.cancel();
        let _ = listener.handle.await;

        tracing::info!(listener_id = %id, "listener stopped");
        Ok(())
    }

    /// Start every enabled listener; log and continue on individual
    /// failures.
    pub async fn start_all(&self, listeners: &[ListenerConfig]) {
        for listener in listeners.iter().filter(|l| l.enabled) {
            if let Err(e) = self.start(listener).await {
                tracing::error!(
                    listener_id = %listener.id,
                    name = %listener.name,
                    error = %e,
                    "failed to start listener"
                );
            }
        }
    }

    /// Stop all running listeners (process shutdown).
    pub async fn shutdown(&self) {
        let ids: Vec<String> = self.active.read().keys().cloned().collect();
        for id in ids {
            let _ = self.stop(&id).await;
        }
    }

    async fn spawn_udp(
        &self,
        listener: &ListenerConfig,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let addr: SocketAddr = bind_addr(listener.port);
        let socket = udp::bind_udp_socket(addr).map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        tracing::info!(
            listener_id = %listener.id,
            port = listener.port,
            "UDP syslog listener bound"
        );

        let id = listener.id.clone();
        let parser = listener.parser;
        let pipeline = Arc::clone(&self.pipeline);
        Ok(tokio::spawn(async move {
            udp::run_udp_listener(id, socket, pipeline, parser, cancel).await;
        }))
    }

    async fn spawn_tcp(
        &self,
        listener: &ListenerConfig,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let addr = bind_addr(listener.port);
        let tcp_listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_string(),
                source: e,
            })?;

        tracing::info!(
            listener_id = %listener.id,
            port = listener.port,
            framing = ?listener.framing,
            parser = %listener.parser.as_str(),
            "TCP syslog listener bound"
        );

        let id = listener.id.clone();
        let parser = listener.parser;
        let framing = listener.framing;
        let pipeline = Arc::clone(&self.pipeline);
        Ok(tokio::spawn(async move {
            tcp::run_tcp_listener(id, tcp_listener, pipeline, parser, framing, cancel).await;
        }))
    }

    async fn spawn_tls(
        &self,
        listener: &ListenerConfig,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let tls_config = tls::load_tls_config(listener)?;
        let acceptor = TlsAcceptor::from(tls_config);

        let addr = bind_addr(listener.port);
        let tcp_listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_string(),
                source: e,
            })?;

        tracing::info!(
            listener_id = %listener.id,
            port = listener.port,
            parser = %listener.parser.as_str(),
            "TLS syslog listener bound (octet counting)"
        );

        let id = listener.id.clone();
        let parser = listener.parser;
        let pipeline = Arc::clone(&self.pipeline);
        Ok(tokio::spawn(async move {
            tls::run_tls_listener(id, tcp_listener, acceptor, pipeline, parser, cancel).await;
        }))
    }
}

fn bind_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], port))
}

#[cfg(test)]
#[path = "supervisor_test.rs"]
mod supervisor_test;
