//! Magio TV upstream adaptation layer.
//!
//! [`session`] owns the token lifecycle, [`client`] the metadata operations,
//! [`resolver`] the redirect hop to the playable URL and [`playlist`] the M3U
//! rendering. Internally everything speaks [`MagioError`]; the public
//! operations collapse failures to `None`/empty/`false` after logging, so the
//! HTTP layer only ever maps sentinels.

pub mod client;
pub mod playlist;
pub mod resolver;
pub mod session;
pub mod store;
pub mod types;

pub use session::{MagioSession, SessionConfig};
pub use store::TokenStore;

use thiserror::Error;

/// Internal failure taxonomy. Only logging distinguishes these; callers of
/// the public operations see uniform empty sentinels.
#[derive(Debug, Error)]
pub enum MagioError {
    #[error("authentication failed")]
    Auth,
    #[error("upstream rejected the request: {0}")]
    Upstream(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not found")]
    NotFound,
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl MagioError {
    /// Rejection with upstream's error detail, or a stock message
    pub fn rejected(error_message: Option<String>) -> Self {
        MagioError::Upstream(error_message.unwrap_or_else(|| "unknown error".to_string()))
    }
}
