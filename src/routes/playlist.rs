use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Deserialize, Default)]
pub struct PlaylistQuery {
    /// "1" (default) proxies playback through this gateway; "0" resolves
    /// direct upstream URLs per channel
    pub proxy: Option<String>,
}

/// GET /api/playlist.m3u
pub async fn playlist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaylistQuery>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let proxied = query.proxy.as_deref().unwrap_or("1") == "1";
    let server_url = proxied.then(|| state.config.base_url.clone());

    let cache_key = format!("playlist_{}", server_url.as_deref().unwrap_or(""));
    let content: String = match state.cache.get(&cache_key).await {
        Some(cached) => cached,
        None => {
            let generated = state.session.generate_playlist(server_url.as_deref()).await;
            if generated.is_empty() {
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "success": false,
                        "message": "Failed to generate playlist"
                    })),
                ));
            }
            state.cache.put(&cache_key, &generated).await;
            generated
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/x-mpegURL"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=magio_tv.m3u",
            ),
        ],
        content,
    )
        .into_response())
}
