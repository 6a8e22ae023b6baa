//! Single-hop redirect resolver.
//!
//! Stream-url responses point at a CDN dispatcher. One authenticated GET
//! with redirects disabled reads the `Location` header as the playable URL
//! without ever pulling the media body.

use super::session::MagioSession;
use super::MagioError;
use crate::models::StreamDescriptor;
use std::collections::HashMap;

/// Media type assumed when upstream omits Content-Type
const DEFAULT_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Host portion (with port, when present) of a URL
fn authority(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            })
        })
        .unwrap_or_default()
}

/// Follow the single redirect hop of `url` and assemble the header set the
/// player must replay verbatim.
pub(crate) async fn resolve(
    session: &MagioSession,
    url: &str,
    is_live: bool,
) -> Result<StreamDescriptor, MagioError> {
    let token = session.access_token().await.ok_or(MagioError::Auth)?;

    let response = session
        .stream_http
        .get(url)
        .header("Host", authority(url))
        .header("User-Agent", &session.cfg.user_agent)
        .header("Accept", "*/*")
        .header("Referer", session.cfg.referer())
        .bearer_auth(&token)
        .send()
        .await?;

    // No Location header means no redirect happened; the dispatcher URL
    // itself is handed back. Whether that URL actually plays is unverified
    // upstream behavior, kept as-is.
    let final_url = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| url.to_string());

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let mut headers = HashMap::new();
    // Host follows the final URL's authority, not the dispatcher's
    headers.insert("Host".to_string(), authority(&final_url));
    headers.insert("User-Agent".to_string(), session.cfg.user_agent.clone());
    headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    headers.insert("Accept".to_string(), "*/*".to_string());
    headers.insert("Referer".to_string(), session.cfg.referer());

    Ok(StreamDescriptor {
        url: final_url,
        headers,
        content_type,
        is_live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::magio::session::tests::{
        spawn_upstream, test_session_config, scratch_store,
    };
    use crate::models::TokenBundle;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    async fn authed_session(base_url: String) -> MagioSession {
        let session = MagioSession::new(test_session_config(base_url), scratch_store())
            .await
            .unwrap();
        session
            .set_tokens(TokenBundle {
                access_token: Some("stream-token".into()),
                refresh_token: Some("r".into()),
                expires: chrono::Utc::now().timestamp() + 3600,
                device_id: "d".into(),
            })
            .await;
        session
    }

    #[test]
    fn authority_keeps_the_port() {
        assert_eq!(authority("http://cdn.example.com:8080/x"), "cdn.example.com:8080");
        assert_eq!(authority("https://cdn.example.com/x"), "cdn.example.com");
        assert_eq!(authority("not a url"), "");
    }

    #[tokio::test]
    async fn follows_single_hop_and_recomputes_host() {
        let router = Router::new().route(
            "/dispatch",
            get(|| async {
                (
                    StatusCode::FOUND,
                    [(header::LOCATION, "http://cdn.example.com:8080/live/index.m3u8")],
                )
                    .into_response()
            }),
        );
        let base_url = spawn_upstream(router).await;
        let session = authed_session(base_url.clone()).await;

        let descriptor = resolve(&session, &format!("{}/dispatch", base_url), true)
            .await
            .unwrap();
        assert_eq!(descriptor.url, "http://cdn.example.com:8080/live/index.m3u8");
        assert_eq!(
            descriptor.headers.get("Host").map(String::as_str),
            Some("cdn.example.com:8080")
        );
        assert_eq!(
            descriptor.headers.get("Authorization").map(String::as_str),
            Some("Bearer stream-token")
        );
        assert!(descriptor.is_live);
    }

    #[tokio::test]
    async fn falls_back_to_original_url_without_location() {
        // suspect upstream behavior: a 200 with no Location leaves the
        // dispatcher URL as the "playable" one
        let router = Router::new().route(
            "/dispatch",
            get(|| async {
                ([(header::CONTENT_TYPE, "video/MP2T")], "ok").into_response()
            }),
        );
        let base_url = spawn_upstream(router).await;
        let session = authed_session(base_url.clone()).await;

        let url = format!("{}/dispatch", base_url);
        let descriptor = resolve(&session, &url, false).await.unwrap();
        assert_eq!(descriptor.url, url);
        assert_eq!(descriptor.content_type, "video/MP2T");
        assert!(!descriptor.is_live);
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_hls() {
        let router = Router::new().route(
            "/dispatch",
            get(|| async {
                (
                    StatusCode::FOUND,
                    [(header::LOCATION, "http://cdn.example.com/a.m3u8")],
                )
                    .into_response()
            }),
        );
        let base_url = spawn_upstream(router).await;
        let session = authed_session(base_url.clone()).await;

        let descriptor = resolve(&session, &format!("{}/dispatch", base_url), true)
            .await
            .unwrap();
        assert_eq!(descriptor.content_type, DEFAULT_CONTENT_TYPE);
    }
}
