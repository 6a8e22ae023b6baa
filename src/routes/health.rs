use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::AppState;

/// GET / - service banner with the endpoint map
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let base_url = &state.config.base_url;
    Json(serde_json::json!({
        "name": "Magio TV Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "channels": format!("{}/api/channels", base_url),
            "stream": format!("{}/api/stream/<channel_id>", base_url),
            "epg": format!("{}/api/epg/<channel_id>", base_url),
            "catchup": format!("{}/api/catchup/<channel_id>/<start>-<end>", base_url),
            "devices": format!("{}/api/devices", base_url),
            "playlist": format!("{}/api/playlist.m3u", base_url),
            "status": format!("{}/api/status", base_url),
        }
    }))
}

/// GET /api/status - session health without touching upstream
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (refresh_token_valid, token_expires_in) = state.session.token_status().await;
    let uptime = state.start_time.elapsed().as_secs();

    Json(serde_json::json!({
        "success": true,
        "status": "online",
        "uptime": uptime,
        "language": state.config.language,
        "quality": state.config.quality,
        "refresh_token_valid": refresh_token_valid,
        "token_expires": token_expires_in,
        "cache_entries": state.cache.len().await,
    }))
}
