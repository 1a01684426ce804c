//! API routes
//!
//! Domain-grouped HTTP route handlers.

pub mod devices;
pub mod listeners;
pub mod logs;
pub mod modules;
pub mod query;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/logs", get(logs::list_logs))
        .route("/api/logs/{id}", get(logs::log_detail))
        .route("/api/stats", get(logs::stats))
        .route("/api/eventtypes", get(logs::event_types))
        .route("/api/clear", post(logs::clear))
        .route("/api/query", post(query::execute))
        .route("/api/aggregate", post(query::aggregate))
        .route("/api/timeseries", post(query::time_series))
        .route(
            "/api/listeners",
            get(listeners::list).post(listeners::create),
        )
        .route(
            "/api/listeners/{id}",
            axum::routing::put(listeners::update).delete(listeners::delete),
        )
        .route("/api/devices", get(devices::list).post(devices::create))
        .route(
            "/api/devices/{id}",
            axum::routing::put(devices::update).delete(devices::delete),
        )
        .route(
            "/api/modules",
            get(modules::list).put(modules::set_enabled),
        )
        .route(
            "/api/severity-overrides",
            get(modules::severity_overrides).put(modules::set_severity_overrides),
        )
        .with_state(state)
}
