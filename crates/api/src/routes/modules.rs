//! Module enable flags and severity overrides

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// `GET /api/modules`: device-type listing, enable flags, and metadata.
pub async fn list(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    Ok(Json(json!({
        "modules": state.registry.device_types(),
        "enabled": state.registry.enabled_modules(),
        "metadata": state.registry.all_metadata(),
    })))
}

/// `PUT /api/modules`: apply enable flags to the live registry and persist
/// them.
pub async fn set_enabled(
    State(state): State<AppState>,
    Json(flags): Json<HashMap<String, bool>>,
) -> Result<Json<HashMap<String, bool>>> {
    state.registry.set_enabled_modules(&flags);

    state.config.mutate(|config| {
        for (device_type, enabled) in &flags {
            config
                .enabled_modules
                .insert(device_type.clone(), *enabled);
        }
    })?;

    Ok(Json(state.registry.enabled_modules()))
}

/// `GET /api/severity-overrides`
pub async fn severity_overrides(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, u8>>> {
    Ok(Json(state.config.severity_overrides()))
}

/// `PUT /api/severity-overrides`: replace the override table.
pub async fn set_severity_overrides(
    State(state): State<AppState>,
    Json(overrides): Json<HashMap<String, u8>>,
) -> Result<Json<HashMap<String, u8>>> {
    if let Some((event_type, severity)) = overrides.iter().find(|(_, s)| **s > 7) {
        return Err(ApiError::BadRequest(format!(
            "severity {} for '{}' out of range (0-7)",
            severity, event_type
        )));
    }

    let stored = overrides.clone();
    state.config.mutate(move |config| {
        config.severity_overrides = stored;
    })?;

    Ok(Json(overrides))
}
