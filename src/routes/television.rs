//! Channel, stream, EPG and catch-up handlers.
//!
//! Handlers consult the response cache first and map the core's empty
//! sentinels to a uniform `{"success": false, "message": ...}` body with a
//! 500 (not initialized / upstream down) or 404 (lookup miss).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{Channel, EpgByChannel, StreamDescriptor};
use crate::AppState;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn failure(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(serde_json::json!({"success": false, "message": message})),
    )
}

#[derive(Deserialize, Default)]
pub struct RedirectQuery {
    #[serde(default)]
    pub redirect: Option<String>,
}

impl RedirectQuery {
    fn wants_redirect(&self) -> bool {
        self.redirect.as_deref() == Some("1")
    }
}

#[derive(Deserialize, Default)]
pub struct EpgQuery {
    pub days_back: Option<i64>,
    pub days_forward: Option<i64>,
}

/// GET /api/channels
pub async fn channels(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let channels: Vec<Channel> = match state.cache.get("channels").await {
        Some(cached) => cached,
        None => {
            let fetched = state.session.list_channels().await;
            if fetched.is_empty() {
                return Err(failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to get channels list",
                ));
            }
            state.cache.put("channels", &fetched).await;
            fetched
        }
    };

    Ok(Json(serde_json::json!({"success": true, "channels": channels})).into_response())
}

/// GET /api/stream/:channel_id
///
/// With `redirect=1` answers a 302 straight to the playable URL.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<i64>,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, ApiError> {
    let cache_key = format!("stream_{}", channel_id);
    let descriptor: StreamDescriptor = match state.cache.get(&cache_key).await {
        Some(cached) => cached,
        None => {
            let resolved = state
                .session
                .resolve_live_stream(channel_id)
                .await
                .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Failed to get stream"))?;
            state.cache.put(&cache_key, &resolved).await;
            resolved
        }
    };

    if query.wants_redirect() {
        Ok(Redirect::temporary(&descriptor.url).into_response())
    } else {
        Ok(Json(serde_json::json!({"success": true, "stream": descriptor})).into_response())
    }
}

/// GET /api/epg - EPG for the whole lineup
pub async fn epg_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EpgQuery>,
) -> Result<Response, ApiError> {
    epg_response(state, None, query).await
}

/// GET /api/epg/:channel_id
pub async fn epg_channel(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<i64>,
    Query(query): Query<EpgQuery>,
) -> Result<Response, ApiError> {
    epg_response(state, Some(channel_id), query).await
}

async fn epg_response(
    state: Arc<AppState>,
    channel_id: Option<i64>,
    query: EpgQuery,
) -> Result<Response, ApiError> {
    let days_back = query.days_back.unwrap_or(1);
    let days_forward = query.days_forward.unwrap_or(1);
    let cache_key = format!(
        "epg_{}_{}_{}",
        channel_id.map_or_else(|| "all".to_string(), |id| id.to_string()),
        days_back,
        days_forward
    );

    let epg: EpgByChannel = match state.cache.get(&cache_key).await {
        Some(cached) => cached,
        None => {
            let fetched = state
                .session
                .fetch_epg(channel_id, days_back, days_forward)
                .await
                .filter(|epg| !epg.is_empty())
                .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Failed to get EPG"))?;
            state.cache.put(&cache_key, &fetched).await;
            fetched
        }
    };

    Ok(Json(serde_json::json!({"success": true, "epg": epg})).into_response())
}

/// Parse a `start-end` epoch-second range
fn parse_time_range(range: &str) -> Option<(i64, i64)> {
    let (start, end) = range.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// GET /api/catchup/:channel_id/:range
///
/// `range` is `start-end` in epoch seconds; the first program overlapping
/// the window is resolved. `redirect=1` answers a 302.
pub async fn catchup(
    State(state): State<Arc<AppState>>,
    Path((channel_id, range)): Path<(i64, String)>,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, ApiError> {
    let (start, end) = parse_time_range(&range)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "Invalid time format"))?;

    let cache_key = format!("catchup_{}_{}_{}", channel_id, start, end);
    let descriptor: StreamDescriptor = match state.cache.get(&cache_key).await {
        Some(cached) => cached,
        None => {
            let resolved = state
                .session
                .resolve_catchup_by_time(channel_id, start, end)
                .await
                .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Failed to get catchup stream"))?;
            state.cache.put(&cache_key, &resolved).await;
            resolved
        }
    };

    if query.wants_redirect() {
        Ok(Redirect::temporary(&descriptor.url).into_response())
    } else {
        Ok(Json(serde_json::json!({"success": true, "stream": descriptor})).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_parses_start_and_end() {
        assert_eq!(parse_time_range("100-200"), Some((100, 200)));
        assert_eq!(parse_time_range("100"), None);
        assert_eq!(parse_time_range("a-b"), None);
        assert_eq!(parse_time_range(""), None);
    }

    #[test]
    fn redirect_flag_only_accepts_one() {
        assert!(RedirectQuery { redirect: Some("1".into()) }.wants_redirect());
        assert!(!RedirectQuery { redirect: Some("0".into()) }.wants_redirect());
        assert!(!RedirectQuery { redirect: None }.wants_redirect());
    }
}
