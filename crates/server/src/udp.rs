//! UDP listener loop

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use siphon_config::Protocol;
use siphon_syslog::{ParserKind, MAX_FRAME_SIZE};

use crate::pipeline::Pipeline;

/// Receive buffer multiplier for datagram bursts.
const RECV_BUFFER_MULTIPLIER: usize = 4;

/// Bind a UDP socket with SO_REUSEADDR and an enlarged receive buffer.
pub(crate) fn bind_udp_socket(addr: SocketAddr) -> std::io::Result<UdpSocket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(socket2::Protocol::UDP))?;
    socket.set_reuse_address(true)?;

    if let Err(e) = socket.set_recv_buffer_size(MAX_FRAME_SIZE * RECV_BUFFER_MULTIPLIER) {
        tracing::warn!(error = %e, "failed to set UDP SO_RCVBUF");
    }

    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    UdpSocket::from_std(socket.into())
}

/// Datagram loop: one message per packet, each dispatched in its own task.
///
/// Exits when the token is cancelled; datagrams already dispatched complete
/// on their own tasks.
pub(crate) async fn run_udp_listener(
    listener_id: String,
    socket: UdpSocket,
    pipeline: Arc<Pipeline>,
    parser: ParserKind,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; MAX_FRAME_SIZE];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            recv = socket.recv_from(&mut buf) => {
                match recv {
                    Ok((len, peer)) => {
                        let data = buf[..len].to_vec();
                        let pipeline = Arc::clone(&pipeline);
                        tokio::spawn(async move {
                            pipeline.process(&data, peer, Protocol::Udp, parser).await;
                        });
                    }
                    Err(e) => {
                        tracing::warn!(listener_id = %listener_id, error = %e, "UDP recv error");
                    }
                }
            }
        }
    }

    tracing::info!(listener_id = %listener_id, "UDP listener stopped");
}
