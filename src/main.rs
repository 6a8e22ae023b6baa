mod config;
mod models;
mod routes;
mod services;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::cache::MemoryCache;
use crate::services::magio::{MagioSession, SessionConfig, TokenStore};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub cache: MemoryCache,
    pub session: MagioSession,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magio_gateway=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Magio TV Gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Upstream: {}", config.upstream_base_url());

    // Token storage, one file per language
    tokio::fs::create_dir_all(&config.data_dir).await?;
    let store = TokenStore::new(&config.data_dir, &config.language);

    // One session for the configured account; tokens reload from disk here
    let session = MagioSession::new(SessionConfig::from_config(&config), store).await?;
    tracing::info!("Session initialized for language {}", config.language);

    // Short-lived response cache in front of the client
    let cache = MemoryCache::new(config.cache_ttl_seconds);
    tracing::info!("Response cache initialized (TTL {}s)", config.cache_ttl_seconds);

    // Build application state
    let state = Arc::new(AppState {
        config,
        cache,
        session,
        start_time: Instant::now(),
    });

    // Build router
    let app = Router::new()
        .route("/", get(routes::health::root))
        .route("/api/status", get(routes::health::status))
        // Television
        .route("/api/channels", get(routes::television::channels))
        .route("/api/stream/:channel_id", get(routes::television::stream))
        .route("/api/epg", get(routes::television::epg_all))
        .route("/api/epg/:channel_id", get(routes::television::epg_channel))
        .route(
            "/api/catchup/:channel_id/:range",
            get(routes::television::catchup),
        )
        // Devices
        .route("/api/devices", get(routes::devices::list))
        .route("/api/devices/delete/:device_id", get(routes::devices::delete))
        // Playlist
        .route("/api/playlist.m3u", get(routes::playlist::playlist))
        // Cache admin
        .route("/api/cache/clear", get(routes::cache::clear))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
