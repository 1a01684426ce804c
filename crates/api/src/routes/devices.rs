//! Device CRUD

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use siphon_config::DeviceConfig;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// `GET /api/devices`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<DeviceConfig>>> {
    Ok(Json(state.config.devices()))
}

/// `POST /api/devices`: create with a generated id when none is supplied.
pub async fn create(
    State(state): State<AppState>,
    Json(mut device): Json<DeviceConfig>,
) -> Result<Json<DeviceConfig>> {
    if device.ip_addresses.is_empty() {
        return Err(ApiError::BadRequest(
            "device requires at least one IP address".to_string(),
        ));
    }

    if device.id.is_empty() {
        device.id = format!("device-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0));
    }

    let created = device.clone();
    state.config.mutate(move |config| {
        config.devices.push(device);
    })?;

    Ok(Json(created))
}

/// `PUT /api/devices/{id}`: replace the stored entry.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut device): Json<DeviceConfig>,
) -> Result<Json<DeviceConfig>> {
    if !state.config.devices().iter().any(|d| d.id == id) {
        return Err(ApiError::not_found("device", &id));
    }

    device.id = id.clone();
    let updated = device.clone();
    state.config.mutate(move |config| {
        if let Some(entry) = config.devices.iter_mut().find(|d| d.id == id) {
            *entry = device;
        }
    })?;

    Ok(Json(updated))
}

/// `DELETE /api/devices/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    if !state.config.devices().iter().any(|d| d.id == id) {
        return Err(ApiError::not_found("device", &id));
    }

    state.config.mutate(|config| {
        config.devices.retain(|d| d.id != id);
    })?;

    Ok(Json(json!({ "status": "deleted" })))
}
