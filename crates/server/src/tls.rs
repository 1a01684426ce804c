//! TLS listener (RFC 5425)
//!
//! TLS connections always use octet-counting framing regardless of the
//! listener's `framing` field. Client certificates are verified when
//! presented (and a CA is configured) but never required - most syslog
//! senders do not use them.

use std::fs::File;
use std::io::BufReader as StdBufReader;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio_rustls::rustls::server::WebPkiClientVerifier;
use tokio_rustls::rustls::{RootCertStore, ServerConfig};
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;

use siphon_config::{ListenerConfig, Protocol};
use siphon_syslog::{ParserKind, MAX_FRAME_SIZE};

use crate::error::{Result, ServerError};
use crate::pipeline::Pipeline;
use crate::tcp::octet_loop;

/// Load the X.509 key pair (and optional client CA) for a TLS listener.
pub(crate) fn load_tls_config(listener: &ListenerConfig) -> Result<Arc<ServerConfig>> {
    if listener.cert_file.is_empty() || listener.key_file.is_empty() {
        return Err(ServerError::MissingTlsMaterial);
    }

    let certs = read_certs(&listener.cert_file)?;
    let key = read_key(&listener.key_file)?;

    let builder = ServerConfig::builder();

    let config = if listener.ca_cert_file.is_empty() {
        builder
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| ServerError::Tls(e.to_string()))?
    } else {
        let mut roots = RootCertStore::empty();
        for cert in read_certs(&listener.ca_cert_file)? {
            roots
                .add(cert)
                .map_err(|e| ServerError::Tls(format!("bad CA certificate: {}", e)))?;
        }

        // Verify client certificates if presented, but don't require them.
        let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
            .allow_unauthenticated()
            .build()
            .map_err(|e| ServerError::Tls(e.to_string()))?;

        builder
            .with_client_cert_verifier(verifier)
            .with_single_cert(certs, key)
            .map_err(|e| ServerError::Tls(e.to_string()))?
    };

    Ok(Arc::new(config))
}

fn read_certs(
    path: &str,
) -> Result<Vec<tokio_rustls::rustls::pki_types::CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| ServerError::Tls(format!("{}: {}", path, e)))?;
    let certs: std::io::Result<Vec<_>> = rustls_pemfile::certs(&mut StdBufReader::new(file)).collect();
    let certs = certs.map_err(|e| ServerError::Tls(format!("{}: {}", path, e)))?;
    if certs.is_empty() {
        return Err(ServerError::Tls(format!("{}: no certificates found", path)));
    }
    Ok(certs)
}

fn read_key(path: &str) -> Result<tokio_rustls::rustls::pki_types::PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| ServerError::Tls(format!("{}: {}", path, e)))?;
    rustls_pemfile::private_key(&mut StdBufReader::new(file))
        .map_err(|e| ServerError::Tls(format!("{}: {}", path, e)))?
        .ok_or_else(|| ServerError::Tls(format!("{}: no private key found", path)))
}

/// Accept loop: TLS handshake per connection, then the octet-count reader.
/// Handshake failures close the connection and the loop continues.
pub(crate) async fn run_tls_listener(
    listener_id: String,
    listener: TcpListener,
    acceptor: TlsAcceptor,
    pipeline: Arc<Pipeline>,
    parser: ParserKind,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let acceptor = acceptor.clone();
                        let pipeline = Arc::clone(&pipeline);
                        let cancel = cancel.clone();
                        tokio::spawn(async move {
                            let tls_stream = match acceptor.accept(stream).await {
                                Ok(s) => s,
                                Err(e) => {
                                    tracing::debug!(peer = %peer, error = %e, "TLS handshake failed");
                                    return;
                                }
                            };

                            let reader = BufReader::with_capacity(MAX_FRAME_SIZE, tls_stream);
                            octet_loop(reader, peer, pipeline, parser, Protocol::Tls, cancel).await;
                        });
                    }
                    Err(e) => {
                        tracing::warn!(listener_id = %listener_id, error = %e, "TLS accept error");
                    }
                }
            }
        }
    }

    tracing::info!(listener_id = %listener_id, "TLS listener stopped");
}
