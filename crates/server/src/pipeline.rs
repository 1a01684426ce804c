//! Ingestion pipeline
//!
//! One entry point, [`Pipeline::process`], called once per framed message:
//!
//! 1. best-effort parse (RFC5424 → RFC3164 → raw fallback)
//! 2. device authorization by peer IP against the configured device table
//! 3. module classification when the device type is "generic"
//! 4. severity override by event type, with priority recomputed
//! 5. store insert (plus row-cap pruning)
//! 6. stats counters
//!
//! Config tables are snapshotted once at the start of processing so a
//! concurrent operator mutation cannot change the rules mid-message.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;

use siphon_config::{ConfigStore, Protocol};
use siphon_modules::ModuleRegistry;
use siphon_store::{LogEntry, LogStore};
use siphon_syslog::{parse_best_effort, ParserKind};

use crate::stats::ServerStats;

/// What happened to a processed frame. Used by tests and logging; the
/// network loops ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Stored,
    /// No configured device matched the peer address.
    Unauthorized,
    StoreFailed,
}

/// The shared ingestion pipeline.
pub struct Pipeline {
    store: Arc<LogStore>,
    config: Arc<ConfigStore>,
    registry: Arc<ModuleRegistry>,
    stats: Arc<ServerStats>,
}

impl Pipeline {
    pub fn new(
        store: Arc<LogStore>,
        config: Arc<ConfigStore>,
        registry: Arc<ModuleRegistry>,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            store,
            config,
            registry,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    /// Process one framed message from a peer.
    pub async fn process(
        &self,
        data: &[u8],
        peer: SocketAddr,
        protocol: Protocol,
        _parser: ParserKind,
    ) -> ProcessOutcome {
        let (msg, rfc) = parse_best_effort(data);

        let raw_message = String::from_utf8_lossy(data).trim_end().to_string();
        let timestamp = msg.timestamp.unwrap_or_else(Utc::now);

        let mut entry = LogEntry {
            timestamp,
            priority: msg.priority,
            facility: msg.facility,
            severity: msg.severity,
            version: msg.version,
            hostname: msg.hostname.unwrap_or_default(),
            appname: msg.appname.unwrap_or_default(),
            procid: msg.procid.unwrap_or_default(),
            msgid: msg.msgid.unwrap_or_default(),
            message: msg.message.unwrap_or_default(),
            structured_data: msg.structured_data,
            raw_message,
            remote_addr: peer.to_string(),
            ..Default::default()
        };

        // Authorization: the peer IP must match a device bound to a
        // listener. Unknown senders are dropped before any store write.
        let devices = self.config.devices();
        let peer_ip = peer.ip().to_string();
        let Some(device) = devices.iter().find(|d| d.matches_ip(&peer_ip)) else {
            tracing::info!(
                peer = %peer,
                preview = %preview(&entry.raw_message),
                "rejected message: no configured device with matching IP"
            );
            return ProcessOutcome::Unauthorized;
        };

        entry.device_type = device.device_type.clone();

        // Generic devices get module classification; configured vendor
        // types are authoritative and modules never override them.
        if device.device_type == "generic" {
            let parsed = self.registry.parse_log(
                &entry.raw_message,
                entry.timestamp,
                entry.severity,
                entry.priority,
            );
            if parsed.device_type != "unknown" {
                entry.device_type = parsed.device_type;
                entry.event_type = parsed.event_type;
                entry.event_category = parsed.event_category;
                entry.parsed_fields = parsed.fields;
            }
        }

        // Severity override by classified event type.
        if !entry.event_type.is_empty() {
            let overrides = self.config.severity_overrides();
            if let Some(&severity) = overrides.get(&entry.event_type) {
                entry.severity = severity.min(7);
                entry.priority = entry.facility * 8 + entry.severity;
            }
        }

        if let Err(e) = self
            .store
            .insert_log(&entry, protocol.as_str(), rfc)
            .await
        {
            tracing::error!(peer = %peer, error = %e, "failed to persist log entry");
            return ProcessOutcome::StoreFailed;
        }

        let limit = self.config.database_limit();
        if limit > 0 {
            if let Err(e) = self.store.prune(limit).await {
                tracing::warn!(error = %e, "log pruning failed");
            }
        }

        tracing::debug!(
            peer = %peer,
            device_type = %entry.device_type,
            event_type = %entry.event_type,
            rfc = %rfc,
            "stored log entry"
        );

        self.stats.record(rfc, protocol);
        ProcessOutcome::Stored
    }
}

/// First 100 characters of a message, for reject log lines.
fn preview(raw: &str) -> &str {
    let end = raw
        .char_indices()
        .take(100)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &raw[..end]
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
