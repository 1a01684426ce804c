//! Row operations: insert, retrieval, pruning

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use turso::Value;

use siphon_modules::FieldValue;
use siphon_syslog::{RfcFormat, StructuredData};

use crate::db::LogStore;
use crate::entry::LogEntry;
use crate::error::{Result, StoreError};
use crate::query::LogQuery;

/// Timestamp column format. Matches SQLite's `datetime('now')` lexical
/// order so relative-range comparisons work on the text column.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_ts(text: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn col_text(row: &turso::Row, idx: usize) -> String {
    row.get_value(idx)
        .ok()
        .and_then(|v| v.as_text().cloned())
        .unwrap_or_default()
}

pub(crate) fn col_i64(row: &turso::Row, idx: usize) -> i64 {
    row.get_value(idx)
        .ok()
        .and_then(|v| v.as_integer().copied())
        .unwrap_or(0)
}

const SELECT_COLUMNS: &str = "id, timestamp, priority, facility, severity, version, \
     hostname, appname, procid, msgid, message, \
     structured_data, raw_message, remote_addr, \
     device_type, event_type, event_category, parsed_fields";

impl LogStore {
    /// Insert a single entry. The transport protocol and RFC format ride
    /// alongside the entry in their own columns.
    pub async fn insert_log(
        &self,
        entry: &LogEntry,
        protocol: &str,
        rfc: RfcFormat,
    ) -> Result<()> {
        let structured = serde_json::to_string(&entry.structured_data)?;
        let parsed = serde_json::to_string(&entry.parsed_fields)?;

        let conn = self.connect()?;
        conn.execute(
            r#"
            INSERT INTO logs (
                timestamp, priority, facility, severity, version,
                hostname, appname, procid, msgid, message,
                structured_data, raw_message, remote_addr, protocol, rfc_format,
                device_type, event_type, event_category, parsed_fields
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            vec![
                Value::Text(format_ts(entry.timestamp)),
                Value::Integer(entry.priority as i64),
                Value::Integer(entry.facility as i64),
                Value::Integer(entry.severity as i64),
                Value::Integer(entry.version as i64),
                Value::Text(entry.hostname.clone()),
                Value::Text(entry.appname.clone()),
                Value::Text(entry.procid.clone()),
                Value::Text(entry.msgid.clone()),
                Value::Text(entry.message.clone()),
                Value::Text(structured),
                Value::Text(entry.raw_message.clone()),
                Value::Text(entry.remote_addr.clone()),
                Value::Text(protocol.to_string()),
                Value::Text(rfc.as_str().to_string()),
                Value::Text(entry.device_type.clone()),
                Value::Text(entry.event_type.clone()),
                Value::Text(entry.event_category.clone()),
                Value::Text(parsed),
            ],
        )
        .await?;

        Ok(())
    }

    /// Delete the oldest rows beyond `limit`. A limit of 0 means unlimited.
    pub async fn prune(&self, limit: u64) -> Result<u64> {
        if limit == 0 {
            return Ok(0);
        }

        let conn = self.connect()?;
        let deleted = conn
            .execute(
                "DELETE FROM logs WHERE id NOT IN (SELECT id FROM logs ORDER BY id DESC LIMIT ?)",
                vec![Value::Integer(limit as i64)],
            )
            .await?;

        Ok(deleted)
    }

    /// Filtered, paginated retrieval, newest first.
    pub async fn get_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let mut sql = format!("SELECT {} FROM logs WHERE 1=1", SELECT_COLUMNS);
        let mut params: Vec<Value> = Vec::new();

        match (&query.date_from, &query.date_to) {
            (Some(from), Some(to)) => {
                sql.push_str(" AND timestamp >= ? AND timestamp <= ?");
                params.push(Value::Text(from.clone()));
                params.push(Value::Text(to.clone()));
            }
            _ => {
                if let Some(range) = query.date_range {
                    sql.push_str(" AND timestamp > ");
                    sql.push_str(range.cutoff_expr());
                }
            }
        }

        if let Some(severity) = query.severity {
            sql.push_str(" AND severity = ?");
            params.push(Value::Integer(severity as i64));
        }

        if let Some(device) = &query.device {
            sql.push_str(" AND (hostname LIKE ? OR remote_addr LIKE ? OR parsed_fields LIKE ?)");
            let pattern = format!("%{}%", device);
            params.push(Value::Text(pattern.clone()));
            params.push(Value::Text(pattern.clone()));
            params.push(Value::Text(pattern));
        }

        if let Some(device_type) = &query.device_type {
            sql.push_str(" AND device_type = ?");
            params.push(Value::Text(device_type.clone()));
        }

        if let Some(event_type) = &query.event_type {
            sql.push_str(" AND event_type = ?");
            params.push(Value::Text(event_type.clone()));
        }

        if let Some(search) = &query.search {
            sql.push_str(
                " AND (raw_message LIKE ? OR message LIKE ? OR hostname LIKE ? \
                 OR appname LIKE ? OR device_type LIKE ? OR event_type LIKE ? \
                 OR event_category LIKE ? OR parsed_fields LIKE ?)",
            );
            let pattern = format!("%{}%", search);
            for _ in 0..8 {
                params.push(Value::Text(pattern.clone()));
            }
        }

        // turso 0.1.5 fails to bind a parameter in the OFFSET position
        // ("MustBeInt: the value in register cannot be cast to integer"),
        // so the offset is inlined as a literal integer instead.
        sql.push_str(&format!(
            " ORDER BY timestamp DESC LIMIT ? OFFSET {}",
            query.offset as i64
        ));
        params.push(Value::Integer(query.limit.max(1) as i64));

        let conn = self.connect()?;
        let mut rows = conn.query(&sql, params).await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }

        Ok(entries)
    }

    /// Fetch one entry by id.
    pub async fn get_log_by_id(&self, id: i64) -> Result<LogEntry> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM logs WHERE id = ?", SELECT_COLUMNS),
                vec![Value::Integer(id)],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row_to_entry(&row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// Distinct event types for filter dropdowns, excluding empty and
    /// "unknown".
    pub async fn get_event_types(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut rows = conn
            .query(
                "SELECT DISTINCT event_type FROM logs \
                 WHERE event_type IS NOT NULL AND event_type != '' AND event_type != 'unknown' \
                 ORDER BY event_type",
                (),
            )
            .await?;

        let mut types = Vec::new();
        while let Some(row) = rows.next().await? {
            types.push(col_text(&row, 0));
        }

        Ok(types)
    }

    /// Delete all rows.
    pub async fn clear_logs(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM logs", ()).await?;
        Ok(())
    }
}

fn row_to_entry(row: &turso::Row) -> Result<LogEntry> {
    let structured_json = col_text(row, 11);
    let parsed_json = col_text(row, 17);

    let structured_data: StructuredData = if structured_json.is_empty() {
        StructuredData::new()
    } else {
        serde_json::from_str(&structured_json).unwrap_or_default()
    };

    let parsed_fields: HashMap<String, FieldValue> = if parsed_json.is_empty() {
        HashMap::new()
    } else {
        serde_json::from_str(&parsed_json).unwrap_or_default()
    };

    Ok(LogEntry {
        id: col_i64(row, 0),
        timestamp: parse_ts(&col_text(row, 1)),
        priority: col_i64(row, 2) as u8,
        facility: col_i64(row, 3) as u8,
        severity: col_i64(row, 4) as u8,
        version: col_i64(row, 5) as u16,
        hostname: col_text(row, 6),
        appname: col_text(row, 7),
        procid: col_text(row, 8),
        msgid: col_text(row, 9),
        message: col_text(row, 10),
        structured_data,
        raw_message: col_text(row, 12),
        remote_addr: col_text(row, 13),
        device_type: col_text(row, 14),
        event_type: col_text(row, 15),
        event_category: col_text(row, 16),
        parsed_fields,
    })
}

#[cfg(test)]
#[path = "logs_test.rs"]
mod logs_test;
