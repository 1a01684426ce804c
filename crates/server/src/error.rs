//! Server error types

use std::io;

use thiserror::Error;

use siphon_config::Protocol;

/// Result type for supervisor operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors from listener lifecycle management
#[derive(Debug, Error)]
pub enum ServerError {
    /// A listener with this id already has a live accept loop
    #[error("listener {0} is already running")]
    AlreadyRunning(String),

    /// The port failed the bind probe for the requested protocol
    #[error("port {port}/{protocol} is already in use")]
    PortInUse { protocol: Protocol, port: u16 },

    /// Failed to bind the listening socket
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// TLS listener without certificate material
    #[error("tls listener requires cert_file and key_file")]
    MissingTlsMaterial,

    /// Certificate/key loading or TLS configuration failure
    #[error("tls configuration error: {0}")]
    Tls(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
