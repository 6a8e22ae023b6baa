//! M3U playlist rendering.
//!
//! With a server URL the playlist points players back at this gateway
//! (`/api/stream/{id}?redirect=1`) and advertises catch-up for archived
//! channels. Without one, every channel is resolved to a direct upstream URL
//! on the spot; a channel that fails to resolve keeps its slot with a
//! placeholder URL so the channel count stays stable for players.

use super::session::MagioSession;
use crate::models::Channel;

/// Emitted for channels whose direct resolution failed
const PLACEHOLDER_URL: &str = "http://127.0.0.1/error.m3u8";

/// Channel display name with the literal " HD" suffix stripped
fn display_name(name: &str) -> String {
    name.replace(" HD", "")
}

/// The `#EXTINF` metadata line for one channel
fn extinf_line(channel: &Channel, server_url: Option<&str>) -> String {
    let name = display_name(&channel.name);
    let mut line = format!(
        "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" group-title=\"{}\"",
        channel.id, name, channel.group
    );

    // catch-up attributes only when the channel has an archive AND the
    // playlist proxies through this gateway
    if channel.has_archive {
        if let Some(server) = server_url {
            line.push_str(&format!(
                " catchup=\"default\" catchup-source=\"{}/api/catchup/{}/${{start}}-${{end}}\" catchup-days=\"7\"",
                server, channel.id
            ));
        }
    }

    if !channel.logo.is_empty() {
        line.push_str(&format!(" tvg-logo=\"{}\"", channel.logo));
    }

    line.push(',');
    line.push_str(&name);
    line
}

impl MagioSession {
    /// Render the channel lineup as an M3U document. Empty output signals
    /// that the channel list itself could not be fetched.
    pub async fn generate_playlist(&self, server_url: Option<&str>) -> String {
        let channels = self.list_channels().await;
        if channels.is_empty() {
            return String::new();
        }

        let mut playlist = String::from("#EXTM3U\n");
        for channel in &channels {
            playlist.push_str(&extinf_line(channel, server_url));
            playlist.push('\n');

            match server_url {
                Some(server) => {
                    playlist.push_str(&format!(
                        "{}/api/stream/{}?redirect=1\n",
                        server, channel.id
                    ));
                }
                None => match self.resolve_live_stream(channel.id).await {
                    Some(descriptor) => {
                        playlist.push_str(&descriptor.url);
                        playlist.push('\n');
                    }
                    None => {
                        playlist.push_str(PLACEHOLDER_URL);
                        playlist.push('\n');
                    }
                },
            }
        }
        playlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: i64, name: &str, group: &str, has_archive: bool, logo: &str) -> Channel {
        Channel {
            id,
            name: name.to_string(),
            original_name: name.to_string(),
            logo: logo.to_string(),
            group: group.to_string(),
            has_archive,
        }
    }

    #[test]
    fn strips_hd_suffix_from_display_name() {
        assert_eq!(display_name("Foo HD"), "Foo");
        assert_eq!(display_name("Foo"), "Foo");
        assert_eq!(display_name("HD Plus"), "HD Plus");
    }

    #[test]
    fn extinf_line_with_archive_logo_and_server() {
        let line = extinf_line(&channel(1, "Foo HD", "News", true, "L"), Some("http://x"));
        assert_eq!(
            line,
            "#EXTINF:-1 tvg-id=\"1\" tvg-name=\"Foo\" group-title=\"News\" catchup=\"default\" catchup-source=\"http://x/api/catchup/1/${start}-${end}\" catchup-days=\"7\" tvg-logo=\"L\",Foo"
        );
    }

    #[test]
    fn extinf_line_without_archive_or_logo() {
        let line = extinf_line(&channel(2, "Bar", "Sport", false, ""), Some("http://x"));
        assert_eq!(line, "#EXTINF:-1 tvg-id=\"2\" tvg-name=\"Bar\" group-title=\"Sport\",Bar");
    }

    #[test]
    fn no_server_url_means_no_catchup_attributes() {
        let line = extinf_line(&channel(3, "Baz HD", "Film", true, "logo.png"), None);
        assert!(!line.contains("catchup"));
        assert!(line.contains("tvg-logo=\"logo.png\""));
    }

    #[tokio::test]
    async fn proxied_playlist_matches_the_documented_shape() {
        use crate::services::magio::session::tests::{
            auth_router, spawn_upstream, test_session_config, scratch_store, UpstreamCounters,
        };
        use axum::routing::get;
        use axum::Json;
        use std::sync::Arc;

        let counters = Arc::new(UpstreamCounters::default());
        let router = auth_router(counters, true, 0)
            .route(
                "/home/categories",
                get(|| async {
                    Json(serde_json::json!({
                        "categories": [{"name": "News", "channels": [{"channelId": 1}]}]
                    }))
                }),
            )
            .route(
                "/v2/television/channels",
                get(|| async {
                    Json(serde_json::json!({
                        "items": [{"channel": {
                            "channelId": 1, "name": "Foo HD", "logoUrl": "L", "hasArchive": true
                        }}]
                    }))
                }),
            );
        let base_url = spawn_upstream(router).await;
        let session = MagioSession::new(test_session_config(base_url), scratch_store())
            .await
            .unwrap();

        let playlist = session.generate_playlist(Some("http://x")).await;
        let lines: Vec<&str> = playlist.lines().collect();
        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(
            lines[1],
            "#EXTINF:-1 tvg-id=\"1\" tvg-name=\"Foo\" group-title=\"News\" catchup=\"default\" catchup-source=\"http://x/api/catchup/1/${start}-${end}\" catchup-days=\"7\" tvg-logo=\"L\",Foo"
        );
        assert_eq!(lines[2], "http://x/api/stream/1?redirect=1");
    }

    #[tokio::test]
    async fn direct_playlist_keeps_unresolvable_channels_with_placeholder() {
        use crate::services::magio::session::tests::{
            auth_router, spawn_upstream, test_session_config, scratch_store, UpstreamCounters,
        };
        use axum::routing::get;
        use axum::Json;
        use std::sync::Arc;

        let counters = Arc::new(UpstreamCounters::default());
        let router = auth_router(counters, true, 0)
            .route(
                "/home/categories",
                get(|| async { Json(serde_json::json!({"categories": []})) }),
            )
            .route(
                "/v2/television/channels",
                get(|| async {
                    Json(serde_json::json!({
                        "items": [{"channel": {"channelId": 5, "name": "Dead Air"}}]
                    }))
                }),
            )
            .route(
                "/v2/television/stream-url",
                get(|| async {
                    Json(serde_json::json!({"success": false, "errorMessage": "no stream"}))
                }),
            );
        let base_url = spawn_upstream(router).await;
        let session = MagioSession::new(test_session_config(base_url), scratch_store())
            .await
            .unwrap();

        let playlist = session.generate_playlist(None).await;
        let lines: Vec<&str> = playlist.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], PLACEHOLDER_URL);
    }
}
