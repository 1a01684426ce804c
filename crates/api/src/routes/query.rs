//! Query, aggregation, and time-series handlers

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use siphon_store::{AggregateFilters, AggregateOp, AggregateQuery, Bucket, QueryRequest, QueryResult, TimeRange};

use crate::error::Result;
use crate::state::AppState;

/// `POST /api/query`
pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResult>> {
    Ok(Json(state.store.execute_query(&request).await?))
}

/// `POST /api/aggregate`
pub async fn aggregate(
    State(state): State<AppState>,
    Json(request): Json<AggregateQuery>,
) -> Result<Json<QueryResult>> {
    Ok(Json(state.store.aggregate(&request).await?))
}

fn default_op() -> AggregateOp {
    AggregateOp::Count
}

/// `POST /api/timeseries` body.
#[derive(Debug, Deserialize)]
pub struct TimeSeriesRequest {
    #[serde(default)]
    pub interval: Bucket,
    #[serde(default, rename = "timeRange")]
    pub time_range: TimeRange,
    #[serde(default = "default_op")]
    pub operation: AggregateOp,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, rename = "groupBy")]
    pub group_by: Option<String>,
    #[serde(default)]
    pub filters: AggregateFilters,
}

/// `POST /api/timeseries`
pub async fn time_series(
    State(state): State<AppState>,
    Json(request): Json<TimeSeriesRequest>,
) -> Result<Json<QueryResult>> {
    let result = state
        .store
        .time_series(
            request.interval,
            request.time_range,
            request.operation,
            request.field.as_deref(),
            request.group_by.as_deref(),
            &request.filters,
        )
        .await?;

    Ok(Json(result))
}
