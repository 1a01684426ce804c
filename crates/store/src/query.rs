//! Query types and the field whitelist
//!
//! Everything user-controlled that can name a field goes through
//! [`GroupField::parse`] or [`column`], which admit only schema columns or
//! `parsed_fields.<key>` paths. Scalar values never reach SQL text; callers
//! bind them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Schema columns addressable from query surfaces.
pub const COLUMNS: &[&str] = &[
    "id",
    "timestamp",
    "priority",
    "facility",
    "severity",
    "version",
    "hostname",
    "appname",
    "procid",
    "msgid",
    "message",
    "raw_message",
    "remote_addr",
    "protocol",
    "rfc_format",
    "device_type",
    "event_type",
    "event_category",
    "created_at",
];

/// Columns valid as targets of sum/avg/max/min.
pub const NUMERIC_COLUMNS: &[&str] = &["id", "priority", "facility", "severity", "version"];

/// Validate a bare column name against the whitelist.
pub fn column(name: &str) -> Result<&'static str> {
    COLUMNS
        .iter()
        .find(|c| **c == name)
        .copied()
        .ok_or_else(|| StoreError::Field(name.to_string()))
}

/// A validated group-by / aggregation target: either a schema column or a
/// `parsed_fields.<key>` JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupField {
    Column(&'static str),
    JsonPath(String),
}

impl GroupField {
    /// Parse and validate a user-supplied field name.
    pub fn parse(name: &str) -> Result<Self> {
        if let Some(key) = name.strip_prefix("parsed_fields.") {
            if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return Err(StoreError::Field(name.to_string()));
            }
            return Ok(GroupField::JsonPath(key.to_string()));
        }
        Ok(GroupField::Column(column(name)?))
    }

    /// The SQL expression for this field. JSON keys are validated to
    /// `[A-Za-z0-9_]+`, so embedding them in the path literal is safe.
    pub fn expr(&self) -> String {
        match self {
            GroupField::Column(name) => (*name).to_string(),
            GroupField::JsonPath(key) => {
                format!("json_extract(parsed_fields, '$.{}')", key)
            }
        }
    }

    /// Whether sum/avg/max/min may target this field. JSON paths are
    /// allowed (SQLite coerces), columns must be numeric.
    pub fn is_numeric(&self) -> bool {
        match self {
            GroupField::Column(name) => NUMERIC_COLUMNS.contains(name),
            GroupField::JsonPath(_) => true,
        }
    }
}

/// Relative time window for queries and aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    Hour,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl TimeRange {
    /// The SQL cutoff expression (no user input involved).
    pub fn cutoff_expr(&self) -> &'static str {
        match self {
            TimeRange::Hour => "datetime('now', '-1 hour')",
            TimeRange::Day => "datetime('now', '-24 hours')",
            TimeRange::Week => "datetime('now', '-7 days')",
            TimeRange::Month => "datetime('now', '-30 days')",
        }
    }
}

/// Filters for `get_logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    pub limit: u32,
    pub offset: u32,
    /// Severity equality (0-7).
    pub severity: Option<u8>,
    /// Free-text device filter: substring over hostname, remote address,
    /// and the parsed-fields payload.
    pub device: Option<String>,
    pub device_type: Option<String>,
    pub event_type: Option<String>,
    /// Relative window; ignored when an explicit window is set.
    pub date_range: Option<TimeRange>,
    /// Explicit `[from, to]` window (inclusive), `YYYY-MM-DD HH:MM:SS`.
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Free-text search across message/raw/host/app/device/event fields.
    pub search: Option<String>,
}

impl LogQuery {
    /// Query for the newest `limit` entries with no filters.
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }
}

/// Aggregation operations exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateOp::Count => "COUNT",
            AggregateOp::Sum => "SUM",
            AggregateOp::Avg => "AVG",
            AggregateOp::Max => "MAX",
            AggregateOp::Min => "MIN",
        }
    }
}

/// Equality filters for aggregation queries. Scalar values are bound.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateFilters {
    pub device_type: Option<String>,
    pub event_type: Option<String>,
    pub severity: Option<u8>,
    /// Matched against `parsed_fields.action`.
    pub action: Option<String>,
    /// Matched against `parsed_fields.protocol`.
    pub protocol: Option<String>,
}

fn default_top_n() -> u32 {
    10
}

/// `POST /api/aggregate` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateQuery {
    /// Aggregation target for sum/avg/max/min; ignored for count.
    #[serde(default)]
    pub field: Option<String>,
    pub operation: AggregateOp,
    /// Column name or `parsed_fields.<key>` to group by.
    #[serde(default, rename = "groupBy")]
    pub group_by: Option<String>,
    #[serde(default, rename = "timeRange")]
    pub time_range: TimeRange,
    #[serde(default)]
    pub filters: AggregateFilters,
    #[serde(default = "default_top_n", rename = "topN")]
    pub top_n: u32,
}

/// Time-series bucket granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Bucket {
    #[default]
    #[serde(rename = "1h")]
    Hourly,
    #[serde(rename = "1d")]
    Daily,
}

impl Bucket {
    /// Bucketing expression over the timestamp column.
    pub fn expr(&self) -> &'static str {
        match self {
            Bucket::Hourly => "strftime('%Y-%m-%d %H:00:00', timestamp)",
            Bucket::Daily => "date(timestamp)",
        }
    }
}

fn default_limit() -> u32 {
    100
}

/// `POST /api/query` body: the constrained query surface.
///
/// Either a plain projection of whitelisted columns, or a single
/// aggregation, optionally grouped. This replaces the free-form
/// select/where passthrough of earlier revisions.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Columns to project; empty selects `COUNT(*)`.
    #[serde(default)]
    pub select: Vec<String>,
    /// Aggregation instead of projection.
    #[serde(default)]
    pub operation: Option<AggregateOp>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, rename = "groupBy")]
    pub group_by: Option<String>,
    /// Column (or `count`) to order by, descending.
    #[serde(default, rename = "orderBy")]
    pub order_by: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default, rename = "timeRange")]
    pub time_range: TimeRange,
    /// Column-equality filters; values are bound parameters.
    #[serde(default)]
    pub r#where: HashMap<String, String>,
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
