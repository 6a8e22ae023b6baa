use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Deserialize, Default)]
pub struct ClearQuery {
    pub key: Option<String>,
}

/// GET /api/cache/clear - drop one key or the whole response cache
pub async fn clear(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClearQuery>,
) -> impl IntoResponse {
    let message = match query.key {
        Some(key) => {
            state.cache.remove(&key).await;
            format!("Cache key {} cleared", key)
        }
        None => {
            let count = state.cache.clear().await;
            format!("Cache cleared ({} entries)", count)
        }
    };

    Json(serde_json::json!({"success": true, "message": message}))
}
