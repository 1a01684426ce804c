//! Log listing, detail, stats, and purge handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use siphon_modules::ParsedLog;
use siphon_store::{LogEntry, LogQuery, TimeRange};

use crate::error::Result;
use crate::state::AppState;

fn default_limit() -> u32 {
    100
}

/// `GET /api/logs` query parameters.
#[derive(Debug, Deserialize)]
pub struct LogsParams {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
    severity: Option<u8>,
    device: Option<String>,
    device_type: Option<String>,
    event_type: Option<String>,
    date_range: Option<TimeRange>,
    date_from: Option<String>,
    date_to: Option<String>,
    search: Option<String>,
}

pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogsParams>,
) -> Result<Json<Vec<LogEntry>>> {
    let query = LogQuery {
        limit: params.limit.min(1000),
        offset: params.offset,
        severity: params.severity,
        device: params.device.filter(|s| !s.is_empty()),
        device_type: params.device_type.filter(|s| !s.is_empty()),
        event_type: params.event_type.filter(|s| !s.is_empty()),
        date_range: params.date_range,
        date_from: params.date_from.filter(|s| !s.is_empty()),
        date_to: params.date_to.filter(|s| !s.is_empty()),
        search: params.search.filter(|s| !s.is_empty()),
    };

    let logs = state.store.get_logs(&query).await?;
    Ok(Json(logs))
}

/// `GET /api/logs/{id}`: the entry plus the owning module's display
/// projection.
pub async fn log_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let entry = state.store.get_log_by_id(id).await?;

    let parsed = ParsedLog {
        device_type: entry.device_type.clone(),
        event_type: entry.event_type.clone(),
        event_category: entry.event_category.clone(),
        fields: entry.parsed_fields.clone(),
        raw_message: entry.raw_message.clone(),
        timestamp: entry.timestamp,
        severity: entry.severity_name().to_string(),
        priority: entry.priority,
    };
    let display_info = state.registry.display_info(&parsed);

    Ok(Json(json!({
        "log": entry,
        "display_info": display_info,
    })))
}

/// `GET /api/stats`: store aggregates merged with server counters.
pub async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let store_stats = state.store.get_stats().await?;
    let server_stats = state.stats.snapshot();

    let mut merged = serde_json::to_value(&store_stats).unwrap_or_default();
    if let (Some(map), Ok(serde_json::Value::Object(server))) = (
        merged.as_object_mut(),
        serde_json::to_value(&server_stats),
    ) {
        map.extend(server);
    }

    Ok(Json(merged))
}

/// `GET /api/eventtypes`
pub async fn event_types(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.store.get_event_types().await?))
}

/// `POST /api/clear`: purge all rows and reset the server counters.
pub async fn clear(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.store.clear_logs().await?;
    state.stats.reset();

    tracing::info!("log store cleared");
    Ok(Json(json!({ "status": "cleared" })))
}
