use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::models::Device;
use crate::AppState;

/// GET /api/devices
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let devices: Vec<Device> = match state.cache.get("devices").await {
        Some(cached) => cached,
        None => {
            let fetched = state.session.list_devices().await;
            if fetched.is_empty() {
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "success": false,
                        "message": "Failed to get devices list"
                    })),
                ));
            }
            state.cache.put("devices", &fetched).await;
            fetched
        }
    };

    Ok(Json(serde_json::json!({"success": true, "devices": devices})))
}

/// GET /api/devices/delete/:device_id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
) -> impl IntoResponse {
    let success = state.session.delete_device(device_id).await;

    // the upstream list changed; drop the cached copy either way
    state.cache.remove("devices").await;

    Json(serde_json::json!({
        "success": success,
        "message": if success { "Device deleted" } else { "Failed to delete device" },
    }))
}
