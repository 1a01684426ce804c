//! Aggregation and statistics queries
//!
//! All field names pass through the whitelist in [`crate::query`]; filter
//! values are always bound parameters. The only strings spliced into SQL
//! are validated column names, `parsed_fields` paths with
//! `[A-Za-z0-9_]+` keys, and constant expressions.

use std::collections::HashMap;

use serde::Serialize;
use turso::Value;

use crate::db::LogStore;
use crate::error::{Result, StoreError};
use crate::logs::{col_i64, col_text};
use crate::query::{
    column, AggregateFilters, AggregateOp, AggregateQuery, Bucket, GroupField, QueryRequest,
    TimeRange,
};

/// Tabular result of an aggregation or constrained query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, serde_json::Value>>,
}

/// Dashboard statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total: i64,
    /// Count by severity name (Emergency..Debug).
    pub by_severity: HashMap<String, i64>,
    /// Top 10 hostnames by count.
    pub by_hostname: HashMap<String, i64>,
    pub by_protocol: HashMap<String, i64>,
    /// Rows ingested within the last hour.
    pub recent_hour: i64,
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(i),
        Value::Real(f) => serde_json::Value::from(f),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Blob(b) => serde_json::Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Append bound equality predicates for the aggregate filter set.
fn push_filters(filters: &AggregateFilters, sql: &mut String, params: &mut Vec<Value>) {
    if let Some(device_type) = &filters.device_type {
        sql.push_str(" AND device_type = ?");
        params.push(Value::Text(device_type.clone()));
    }
    if let Some(event_type) = &filters.event_type {
        sql.push_str(" AND event_type = ?");
        params.push(Value::Text(event_type.clone()));
    }
    if let Some(severity) = filters.severity {
        sql.push_str(" AND severity = ?");
        params.push(Value::Integer(severity as i64));
    }
    if let Some(action) = &filters.action {
        sql.push_str(" AND json_extract(parsed_fields, '$.action') = ?");
        params.push(Value::Text(action.clone()));
    }
    if let Some(protocol) = &filters.protocol {
        sql.push_str(" AND json_extract(parsed_fields, '$.protocol') = ?");
        params.push(Value::Text(protocol.clone()));
    }
}

/// Build `OP(expr) as value`, validating numeric targets.
fn aggregate_expr(operation: AggregateOp, field: Option<&str>) -> Result<String> {
    if operation == AggregateOp::Count {
        return Ok("COUNT(*) as value".to_string());
    }

    let name = field.unwrap_or("severity");
    let target = GroupField::parse(name)?;
    if !target.is_numeric() {
        return Err(StoreError::NotNumeric(name.to_string()));
    }
    Ok(format!("{}({}) as value", operation.as_sql(), target.expr()))
}

impl LogStore {
    /// Dashboard statistics: totals, severity/hostname/protocol breakdowns,
    /// and last-hour volume.
    pub async fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.connect()?;

        let mut rows = conn.query("SELECT COUNT(*) FROM logs", ()).await?;
        let total = match rows.next().await? {
            Some(row) => col_i64(&row, 0),
            None => 0,
        };

        let mut by_severity = HashMap::new();
        let mut rows = conn
            .query(
                "SELECT severity, COUNT(*) FROM logs GROUP BY severity ORDER BY severity",
                (),
            )
            .await?;
        while let Some(row) = rows.next().await? {
            let severity = col_i64(&row, 0) as u8;
            by_severity.insert(
                siphon_syslog::severity_name(severity).to_string(),
                col_i64(&row, 1),
            );
        }

        let mut by_hostname = HashMap::new();
        let mut rows = conn
            .query(
                "SELECT hostname, COUNT(*) as count FROM logs \
                 WHERE hostname IS NOT NULL AND hostname != '' \
                 GROUP BY hostname ORDER BY count DESC LIMIT 10",
                (),
            )
            .await?;
        while let Some(row) = rows.next().await? {
            by_hostname.insert(col_text(&row, 0), col_i64(&row, 1));
        }

        let mut by_protocol = HashMap::new();
        let mut rows = conn
            .query(
                "SELECT protocol, COUNT(*) FROM logs WHERE protocol IS NOT NULL GROUP BY protocol",
                (),
            )
            .await?;
        while let Some(row) = rows.next().await? {
            by_protocol.insert(col_text(&row, 0), col_i64(&row, 1));
        }

        let mut rows = conn
            .query(
                &format!(
                    "SELECT COUNT(*) FROM logs WHERE timestamp > {}",
                    TimeRange::Hour.cutoff_expr()
                ),
                (),
            )
            .await?;
        let recent_hour = match rows.next().await? {
            Some(row) => col_i64(&row, 0),
            None => 0,
        };

        Ok(StoreStats {
            total,
            by_severity,
            by_hostname,
            by_protocol,
            recent_hour,
        })
    }

    /// Grouped aggregation over a time window (`POST /api/aggregate`).
    pub async fn aggregate(&self, query: &AggregateQuery) -> Result<QueryResult> {
        let select = aggregate_expr(query.operation, query.field.as_deref())?;

        let mut sql;
        let mut params: Vec<Value> = Vec::new();

        match &query.group_by {
            Some(group_by) => {
                let group = GroupField::parse(group_by)?;
                sql = format!(
                    "SELECT {}, {} as group_value FROM logs WHERE timestamp > {}",
                    select,
                    group.expr(),
                    query.time_range.cutoff_expr()
                );
                push_filters(&query.filters, &mut sql, &mut params);
                sql.push_str(&format!(
                    " GROUP BY {} ORDER BY value DESC",
                    group.expr()
                ));
            }
            None => {
                sql = format!(
                    "SELECT {} FROM logs WHERE timestamp > {}",
                    select,
                    query.time_range.cutoff_expr()
                );
                push_filters(&query.filters, &mut sql, &mut params);
            }
        }

        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(query.top_n.max(1) as i64));

        let columns = if query.group_by.is_some() {
            vec!["value".to_string(), "group_value".to_string()]
        } else {
            vec!["value".to_string()]
        };

        self.run_tabular(&sql, params, columns).await
    }

    /// Time-bucketed aggregation (`POST /api/timeseries`), hourly or daily,
    /// with an optional secondary group-by series.
    pub async fn time_series(
        &self,
        bucket: Bucket,
        time_range: TimeRange,
        operation: AggregateOp,
        field: Option<&str>,
        group_by: Option<&str>,
        filters: &AggregateFilters,
    ) -> Result<QueryResult> {
        let select = aggregate_expr(operation, field)?;
        let bucket_expr = bucket.expr();

        let mut sql = format!(
            "SELECT {} as time_bucket, {}",
            bucket_expr, select
        );

        let series = match group_by {
            Some(name) => Some(GroupField::parse(name)?),
            None => None,
        };
        if let Some(series) = &series {
            sql.push_str(&format!(", {} as series", series.expr()));
        }

        sql.push_str(&format!(
            " FROM logs WHERE timestamp > {}",
            time_range.cutoff_expr()
        ));

        let mut params: Vec<Value> = Vec::new();
        push_filters(filters, &mut sql, &mut params);

        match &series {
            Some(series) => sql.push_str(&format!(
                " GROUP BY time_bucket, {} ORDER BY time_bucket",
                series.expr()
            )),
            None => sql.push_str(" GROUP BY time_bucket ORDER BY time_bucket"),
        }

        let mut columns = vec!["time_bucket".to_string(), "value".to_string()];
        if series.is_some() {
            columns.push("series".to_string());
        }

        self.run_tabular(&sql, params, columns).await
    }

    /// The constrained query surface (`POST /api/query`): a projection of
    /// whitelisted columns or a single aggregation, with bound equality
    /// filters.
    pub async fn execute_query(&self, request: &QueryRequest) -> Result<QueryResult> {
        let mut params: Vec<Value> = Vec::new();

        // Projection or aggregation.
        let mut columns: Vec<String>;
        let select = match request.operation {
            Some(operation) => {
                columns = vec!["value".to_string()];
                aggregate_expr(operation, request.field.as_deref())?
            }
            None if request.select.is_empty() => {
                columns = vec!["value".to_string()];
                "COUNT(*) as value".to_string()
            }
            None => {
                let mut projected = Vec::with_capacity(request.select.len());
                for name in &request.select {
                    projected.push(column(name)?);
                }
                columns = projected.iter().map(|c| c.to_string()).collect();
                projected.join(", ")
            }
        };

        let group = match &request.group_by {
            Some(name) => Some(GroupField::parse(name)?),
            None => None,
        };

        let mut sql = format!("SELECT {}", select);
        if let Some(group) = &group {
            sql.push_str(&format!(", {} as group_value", group.expr()));
            columns.push("group_value".to_string());
        }
        sql.push_str(&format!(
            " FROM logs WHERE timestamp > {}",
            request.time_range.cutoff_expr()
        ));

        for (name, value) in &request.r#where {
            let target = GroupField::parse(name)?;
            sql.push_str(&format!(" AND {} = ?", target.expr()));
            params.push(Value::Text(value.clone()));
        }

        if let Some(group) = &group {
            sql.push_str(&format!(" GROUP BY {}", group.expr()));
        }

        if let Some(order_by) = &request.order_by {
            if order_by == "value" || order_by == "count" {
                sql.push_str(" ORDER BY value DESC");
            } else {
                let target = GroupField::parse(order_by)?;
                sql.push_str(&format!(" ORDER BY {} DESC", target.expr()));
            }
        }

        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(request.limit.max(1) as i64));

        self.run_tabular(&sql, params, columns).await
    }

    /// Run a query and collect rows into column-name-keyed JSON maps.
    /// `columns` names the result columns in select order.
    async fn run_tabular(
        &self,
        sql: &str,
        params: Vec<Value>,
        columns: Vec<String>,
    ) -> Result<QueryResult> {
        let conn = self.connect()?;
        let mut rows = conn.query(sql, params).await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let mut map = HashMap::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                let value = row.get_value(i).unwrap_or(Value::Null);
                map.insert(name.clone(), value_to_json(value));
            }
            out.push(map);
        }

        Ok(QueryResult { columns, rows: out })
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod aggregate_test;
