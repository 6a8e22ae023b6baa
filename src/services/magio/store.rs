//! Durable token storage.
//!
//! One JSON file per language (`token_cz.json`, `token_sk.json`, ...) holding
//! the whole [`TokenBundle`]. Writes go to a temp file first and are renamed
//! into place so a crash mid-write never leaves a half-updated file that
//! still parses.

use crate::models::TokenBundle;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Store for the given language under `data_dir`
    pub fn new(data_dir: impl AsRef<Path>, language: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("token_{}.json", language)),
        }
    }

    /// Load the persisted bundle. A missing or malformed file is not an
    /// error; it yields an empty bundle with a fresh device id.
    pub async fn load(&self) -> TokenBundle {
        match fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str::<TokenBundle>(&content) {
                Ok(bundle) => {
                    tracing::info!("Tokens loaded from {}", self.path.display());
                    bundle
                }
                Err(e) => {
                    tracing::warn!(
                        "Malformed token file {}, starting fresh: {}",
                        self.path.display(),
                        e
                    );
                    TokenBundle::empty()
                }
            },
            Err(_) => TokenBundle::empty(),
        }
    }

    /// Persist the bundle atomically (write-to-temp, sync, rename)
    pub async fn save(&self, bundle: &TokenBundle) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string(bundle)?;

        let mut file = File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        // Atomic replace to avoid readers seeing partial writes
        let _ = fs::remove_file(&self.path).await;
        fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!("Tokens saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("magio-store-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let dir = scratch_dir();
        let store = TokenStore::new(&dir, "cz");

        let bundle = TokenBundle {
            access_token: Some("acc".into()),
            refresh_token: Some("ref".into()),
            expires: 1_700_000_000,
            device_id: "11111111-2222-3333-4444-555555555555".into(),
        };
        store.save(&bundle).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.access_token.as_deref(), Some("acc"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("ref"));
        assert_eq!(loaded.expires, 1_700_000_000);
        assert_eq!(loaded.device_id, bundle.device_id);

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_file_loads_empty_bundle() {
        let dir = scratch_dir();
        let store = TokenStore::new(&dir, "sk");

        let loaded = store.load().await;
        assert!(loaded.access_token.is_none());
        assert!(loaded.refresh_token.is_none());
        assert_eq!(loaded.expires, 0);
    }

    #[tokio::test]
    async fn corrupted_file_loads_empty_bundle() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join("token_cz.json"), b"{not json at all")
            .await
            .unwrap();

        let store = TokenStore::new(&dir, "cz");
        let loaded = store.load().await;
        assert!(loaded.access_token.is_none());
        assert_eq!(loaded.expires, 0);

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn file_uses_contract_field_names() {
        let dir = scratch_dir();
        let store = TokenStore::new(&dir, "cz");
        store
            .save(&TokenBundle {
                access_token: Some("a".into()),
                refresh_token: Some("r".into()),
                expires: 5,
                device_id: "d".into(),
            })
            .await
            .unwrap();

        let raw = fs::read_to_string(dir.join("token_cz.json")).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["access_token"], "a");
        assert_eq!(value["refresh_token"], "r");
        assert_eq!(value["expires"], 5);
        assert_eq!(value["device_id"], "d");

        let _ = fs::remove_dir_all(&dir).await;
    }
}
