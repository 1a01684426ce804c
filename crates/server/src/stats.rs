//! Server-side ingestion counters
//!
//! Monotonic counters over accepted messages, separate from the store's
//! row counts (a purge resets both, but only through the clear endpoint).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use siphon_config::Protocol;
use siphon_syslog::RfcFormat;

#[derive(Debug, Default)]
struct StatsInner {
    total: u64,
    by_rfc: HashMap<String, u64>,
    by_proto: HashMap<String, u64>,
    last_message: Option<DateTime<Utc>>,
}

/// Serializable snapshot of the counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub server_total: u64,
    pub server_by_rfc: HashMap<String, u64>,
    pub server_by_proto: HashMap<String, u64>,
    pub last_message: Option<DateTime<Utc>>,
}

/// Process-wide ingestion statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    inner: Mutex<StatsInner>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one accepted message. The total, the per-format counter, and
    /// the per-transport counter move together under one lock.
    pub fn record(&self, rfc: RfcFormat, protocol: Protocol) {
        let mut inner = self.inner.lock();
        inner.total += 1;
        *inner.by_rfc.entry(rfc.as_str().to_string()).or_default() += 1;
        *inner
            .by_proto
            .entry(protocol.as_str().to_string())
            .or_default() += 1;
        inner.last_message = Some(Utc::now());
    }

    /// Reset all counters (log purge).
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.total = 0;
        inner.by_rfc.clear();
        inner.by_proto.clear();
        inner.last_message = None;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            server_total: inner.total,
            server_by_rfc: inner.by_rfc.clone(),
            server_by_proto: inner.by_proto.clone(),
            last_message: inner.last_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_moves_counters_together() {
        let stats = ServerStats::new();

        stats.record(RfcFormat::Rfc5424, Protocol::Udp);
        stats.record(RfcFormat::Rfc5424, Protocol::Tcp);
        stats.record(RfcFormat::Unknown, Protocol::Udp);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.server_total, 3);
        assert_eq!(snapshot.server_by_rfc.get("RFC5424"), Some(&2));
        assert_eq!(snapshot.server_by_rfc.get("UNKNOWN"), Some(&1));
        assert_eq!(snapshot.server_by_proto.get("UDP"), Some(&2));
        assert_eq!(snapshot.server_by_proto.get("TCP"), Some(&1));
        assert!(snapshot.last_message.is_some());
    }

    #[test]
    fn test_reset() {
        let stats = ServerStats::new();
        stats.record(RfcFormat::Rfc3164, Protocol::Tls);
        stats.reset();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.server_total, 0);
        assert!(snapshot.server_by_rfc.is_empty());
        assert!(snapshot.last_message.is_none());
    }
}
