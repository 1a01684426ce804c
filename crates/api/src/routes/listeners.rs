//! Listener CRUD and runtime start/stop

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use siphon_config::ListenerConfig;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// `GET /api/listeners`: every configured listener with its live state.
pub async fn list(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let listeners = state.config.listeners();
    let rows: Vec<serde_json::Value> = listeners
        .iter()
        .map(|l| {
            let mut value = serde_json::to_value(l).unwrap_or_default();
            if let Some(map) = value.as_object_mut() {
                map.insert(
                    "running".to_string(),
                    json!(state.supervisor.is_running(&l.id)),
                );
            }
            value
        })
        .collect();

    Ok(Json(json!(rows)))
}

/// `POST /api/listeners`: create a listener, disabled, with a generated id
/// when none is supplied. Port conflicts are rejected only against
/// listeners that are actually running.
pub async fn create(
    State(state): State<AppState>,
    Json(mut listener): Json<ListenerConfig>,
) -> Result<Json<ListenerConfig>> {
    let existing = state.config.listeners();
    for other in &existing {
        if other.port == listener.port
            && other.id != listener.id
            && state.supervisor.is_running(&other.id)
        {
            return Err(ApiError::Conflict(format!(
                "port {} is already in use by running listener '{}'",
                listener.port, other.name
            )));
        }
    }

    if listener.id.is_empty() {
        listener.id = format!("listener-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0));
    }
    listener.enabled = false;

    let created = listener.clone();
    state.config.mutate(move |config| {
        config.listeners.push(listener);
    })?;

    Ok(Json(created))
}

/// `PUT /api/listeners/{id}` body: fields to update. `enabled` drives the
/// supervisor; other fields update the stored entry.
#[derive(Debug, Deserialize)]
pub struct ListenerUpdate {
    pub enabled: Option<bool>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// `PUT /api/listeners/{id}`: toggling `enabled=true` starts the accept
/// loop before the flag is persisted; a start failure leaves the stored
/// config untouched. `enabled=false` stops it.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ListenerUpdate>,
) -> Result<Json<ListenerConfig>> {
    let mut listeners = state.config.listeners();
    let Some(listener) = listeners.iter_mut().find(|l| l.id == id) else {
        return Err(ApiError::not_found("listener", &id));
    };

    if let Some(name) = update.name {
        listener.name = name;
    }
    if let Some(description) = update.description {
        listener.description = description;
    }

    if let Some(enabled) = update.enabled {
        if enabled && !state.supervisor.is_running(&id) {
            state.supervisor.start(listener).await?;
        } else if !enabled {
            state.supervisor.stop(&id).await?;
        }
        listener.enabled = enabled;
    }

    let updated = listener.clone();
    let persisted = updated.clone();
    state.config.mutate(move |config| {
        if let Some(entry) = config.listeners.iter_mut().find(|l| l.id == id) {
            *entry = persisted;
        }
    })?;

    Ok(Json(updated))
}

/// `DELETE /api/listeners/{id}`: stop it when running, then remove.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    if !state.config.listeners().iter().any(|l| l.id == id) {
        return Err(ApiError::not_found("listener", &id));
    }

    state.supervisor.stop(&id).await?;

    state.config.mutate(|config| {
        config.listeners.retain(|l| l.id != id);
    })?;

    Ok(Json(json!({ "status": "deleted" })))
}
