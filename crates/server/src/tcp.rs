//! TCP listener and connection loops

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use siphon_config::{Framing, Protocol};
use siphon_syslog::{
    read_line_frame, read_octet_frame, LineFrame, ParserKind, MAX_FRAME_SIZE,
};

use crate::pipeline::Pipeline;

/// Accept loop: one task per connection, all cancelled together.
pub(crate) async fn run_tcp_listener(
    listener_id: String,
    listener: TcpListener,
    pipeline: Arc<Pipeline>,
    parser: ParserKind,
    framing: Framing,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let pipeline = Arc::clone(&pipeline);
                        let cancel = cancel.clone();
                        tokio::spawn(async move {
                            handle_connection(
                                stream, peer, pipeline, parser, framing, Protocol::Tcp, cancel,
                            )
                            .await;
                        });
                    }
                    Err(e) => {
                        tracing::warn!(listener_id = %listener_id, error = %e, "TCP accept error");
                    }
                }
            }
        }
    }

    tracing::info!(listener_id = %listener_id, "TCP listener stopped");
}

/// Per-connection read loop. Messages are dispatched synchronously so one
/// connection's frames keep arrival order.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    pipeline: Arc<Pipeline>,
    parser: ParserKind,
    framing: Framing,
    protocol: Protocol,
    cancel: CancellationToken,
) {
    let reader = BufReader::with_capacity(MAX_FRAME_SIZE, stream);

    match framing {
        Framing::NonTransparent => {
            line_loop(reader, peer, pipeline, parser, protocol, cancel).await;
        }
        Framing::OctetCounting => {
            octet_loop(reader, peer, pipeline, parser, protocol, cancel).await;
        }
    }
}

/// Newline-delimited frames until EOF. Oversized lines are ingested
/// truncated.
pub(crate) async fn line_loop<R: AsyncBufRead + Unpin>(
    mut reader: R,
    peer: SocketAddr,
    pipeline: Arc<Pipeline>,
    parser: ParserKind,
    protocol: Protocol,
    cancel: CancellationToken,
) {
    let mut buf = Vec::with_capacity(4096);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            frame = read_line_frame(&mut reader, &mut buf, MAX_FRAME_SIZE) => {
                match frame {
                    Ok(LineFrame::Complete(0)) => continue,
                    Ok(LineFrame::Complete(_)) => {
                        pipeline.process(&buf, peer, protocol, parser).await;
                    }
                    Ok(LineFrame::Truncated(_)) => {
                        tracing::warn!(peer = %peer, max = MAX_FRAME_SIZE, "oversized line truncated");
                        pipeline.process(&buf, peer, protocol, parser).await;
                    }
                    Ok(LineFrame::Eof) => break,
                    Err(e) => {
                        if !is_connection_reset(&e) {
                            tracing::debug!(peer = %peer, error = %e, "connection read error");
                        }
                        break;
                    }
                }
            }
        }
    }
}

/// Octet-counted frames until EOF. Any framing error ends the connection
/// without a partial record.
pub(crate) async fn octet_loop<R: AsyncBufRead + Unpin>(
    mut reader: R,
    peer: SocketAddr,
    pipeline: Arc<Pipeline>,
    parser: ParserKind,
    protocol: Protocol,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            frame = read_octet_frame(&mut reader, MAX_FRAME_SIZE) => {
                match frame {
                    // An empty token means the peer is done.
                    Ok(Some(payload)) if payload.is_empty() => break,
                    Ok(Some(payload)) => {
                        pipeline.process(&payload, peer, protocol, parser).await;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(peer = %peer, error = %e, "octet framing ended connection");
                        break;
                    }
                }
            }
        }
    }
}

fn is_connection_reset(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
    )
}
