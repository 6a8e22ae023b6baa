//! Session manager: the auth state machine.
//!
//! One session per configured account and language. The token bundle lives
//! behind a `tokio::sync::Mutex` and every login/refresh sequence runs with
//! the lock held, so concurrent callers serialize and a refresh can never
//! race a second refresh into a double-write of the token file.

use super::store::TokenStore;
use super::types::{AuthResponse, TokenPayload};
use super::MagioError;
use crate::config::Config;
use crate::models::{Quality, TokenBundle};
use anyhow::Result;
use reqwest::Client;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

/// Tokens must stay valid at least this far past "now" to skip the network
const AUTH_MARGIN_SECS: i64 = 60;
/// Timeout for list/EPG/device/auth calls
pub(crate) const API_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for stream-url and redirect resolution calls
pub(crate) const STREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-session settings, split from [`Config`] so tests can point the
/// session at an arbitrary upstream.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub username: String,
    pub password: String,
    pub language: String,
    pub quality: Quality,
    pub device_name: String,
    pub device_type: String,
    pub app_version: String,
    pub user_agent: String,
    pub base_url: String,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        let quality = Quality::from_str(&config.quality).unwrap_or_else(|e| {
            tracing::warn!("{}, falling back to p5", e);
            Quality::P5
        });
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            language: config.language.clone(),
            quality,
            device_name: config.device_name.clone(),
            device_type: config.device_type.clone(),
            app_version: config.app_version.clone(),
            user_agent: config.user_agent.clone(),
            base_url: config.upstream_base_url(),
        }
    }

    /// Authority of the upstream base URL, pinned as the `Host` header on
    /// every call ("czgo.magio.tv" in production)
    pub fn host(&self) -> String {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            }))
            .unwrap_or_default()
    }

    pub fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }
}

pub struct MagioSession {
    pub(crate) cfg: SessionConfig,
    /// Metadata/auth client, follows redirects, 30s timeout
    pub(crate) http: Client,
    /// Stream resolution client, redirects disabled, 10s timeout
    pub(crate) stream_http: Client,
    store: TokenStore,
    tokens: Mutex<TokenBundle>,
}

impl MagioSession {
    /// Build a session and load any persisted tokens for its language
    pub async fn new(cfg: SessionConfig, store: TokenStore) -> Result<Self> {
        let http = Client::builder().timeout(API_TIMEOUT).build()?;
        let stream_http = Client::builder()
            .timeout(STREAM_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let tokens = store.load().await;

        Ok(Self {
            cfg,
            http,
            stream_http,
            store,
            tokens: Mutex::new(tokens),
        })
    }

    /// Guarantee a token valid for at least 60 seconds.
    ///
    /// Valid token: returns true with zero network calls. Expired with a
    /// refresh token: one refresh attempt, falling back to exactly one full
    /// login on rejection. No refresh token: straight to login. False means
    /// both paths are exhausted and the session is unusable.
    pub async fn ensure_authenticated(&self) -> bool {
        let mut tokens = self.tokens.lock().await;
        let now = chrono::Utc::now().timestamp();

        if tokens.valid_at(now, AUTH_MARGIN_SECS) {
            return true;
        }

        if tokens.refresh_token.is_some() {
            match self.refresh(&mut tokens).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!("Token refresh failed, retrying with full login: {}", e);
                }
            }
        }

        match self.login(&mut tokens).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                false
            }
        }
    }

    /// Current bearer token, if any
    pub(crate) async fn access_token(&self) -> Option<String> {
        self.tokens.lock().await.access_token.clone()
    }

    /// (refresh token present, seconds until access token expiry) for /api/status
    pub async fn token_status(&self) -> (bool, i64) {
        let tokens = self.tokens.lock().await;
        let remaining = tokens.expires - chrono::Utc::now().timestamp();
        (tokens.refresh_token.is_some(), remaining)
    }

    /// Single POST carrying the refresh token; response shape matches login
    async fn refresh(&self, tokens: &mut TokenBundle) -> Result<(), MagioError> {
        let refresh_token = tokens.refresh_token.clone().ok_or(MagioError::Auth)?;

        let response: AuthResponse = self
            .http
            .post(format!("{}/v2/auth/tokens", self.cfg.base_url))
            .header("Host", self.cfg.host())
            .header("User-Agent", &self.cfg.user_agent)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(MagioError::rejected(response.error_message));
        }

        self.apply_tokens(tokens, response.token).await?;
        tracing::info!("Access token refreshed");
        Ok(())
    }

    /// Two round-trips: device init for a pre-auth token, then credentials
    async fn login(&self, tokens: &mut TokenBundle) -> Result<(), MagioError> {
        let init_response: AuthResponse = self
            .http
            .post(format!("{}/v2/auth/init", self.cfg.base_url))
            .query(&[
                ("dsid", tokens.device_id.as_str()),
                ("deviceName", self.cfg.device_name.as_str()),
                ("deviceType", self.cfg.device_type.as_str()),
                ("osVersion", "0.0.0"),
                ("appVersion", self.cfg.app_version.as_str()),
                ("language", self.cfg.language.to_uppercase().as_str()),
                ("devicePlatform", "GO"),
            ])
            .header("Host", self.cfg.host())
            .header("User-Agent", &self.cfg.user_agent)
            .send()
            .await?
            .json()
            .await?;

        if !init_response.success {
            return Err(MagioError::rejected(init_response.error_message));
        }

        let pre_auth_token = init_response
            .token
            .map(|t| t.access_token)
            .ok_or_else(|| MagioError::Malformed("init response without token".into()))?;

        let login_response: AuthResponse = self
            .http
            .post(format!("{}/v2/auth/login", self.cfg.base_url))
            .header("Host", self.cfg.host())
            .header("User-Agent", &self.cfg.user_agent)
            .bearer_auth(&pre_auth_token)
            .json(&serde_json::json!({
                "loginOrNickname": self.cfg.username,
                "password": self.cfg.password,
            }))
            .send()
            .await?
            .json()
            .await?;

        if !login_response.success {
            return Err(MagioError::rejected(login_response.error_message));
        }

        self.apply_tokens(tokens, login_response.token).await?;
        tracing::info!("Login successful");
        Ok(())
    }

    /// Replace the bundle from a login/refresh payload and persist it, so
    /// in-memory and durable state agree after every successful transition
    async fn apply_tokens(
        &self,
        tokens: &mut TokenBundle,
        payload: Option<TokenPayload>,
    ) -> Result<(), MagioError> {
        let payload =
            payload.ok_or_else(|| MagioError::Malformed("auth response without token".into()))?;
        let refresh_token = payload
            .refresh_token
            .ok_or_else(|| MagioError::Malformed("auth response without refreshToken".into()))?;
        let expires_in_ms = payload
            .expires_in
            .ok_or_else(|| MagioError::Malformed("auth response without expiresIn".into()))?;

        tokens.access_token = Some(payload.access_token);
        tokens.refresh_token = Some(refresh_token);
        tokens.expires = chrono::Utc::now().timestamp() + expires_in_ms / 1000;

        if let Err(e) = self.store.save(tokens).await {
            tracing::warn!("Failed to persist tokens: {}", e);
        }
        Ok(())
    }

    /// Force a bundle into place; test hook for lifecycle tests
    #[cfg(test)]
    pub(crate) async fn set_tokens(&self, bundle: TokenBundle) {
        *self.tokens.lock().await = bundle;
    }

    #[cfg(test)]
    pub(crate) async fn tokens_snapshot(&self) -> TokenBundle {
        self.tokens.lock().await.clone()
    }
}
