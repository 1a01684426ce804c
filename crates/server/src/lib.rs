//! Siphon Server
//!
//! The ingest half of the service: a supervisor over a dynamic set of
//! UDP/TCP/TLS listeners, and the pipeline each received frame flows
//! through (parse → authorize → classify → override → persist → stats).
//!
//! # Lifecycle
//!
//! Listeners are started and stopped at runtime. Every accept/recv loop
//! holds a `CancellationToken`; [`Supervisor::stop`] cancels it, the loop
//! drains, and the join handle is awaited - stop observes actual loop exit.
//!
//! # Dispatch
//!
//! UDP datagrams are handed to short-lived tasks and may interleave.
//! TCP/TLS connections dispatch synchronously inside their read loop, so
//! messages from one connection keep arrival order.

mod error;
mod pipeline;
mod stats;
mod supervisor;
mod tcp;
mod tls;
mod udp;

pub use error::{Result, ServerError};
pub use pipeline::{Pipeline, ProcessOutcome};
pub use stats::{ServerStats, StatsSnapshot};
pub use supervisor::Supervisor;
