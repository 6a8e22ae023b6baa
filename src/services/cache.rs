use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cached payload with absolute expiry
#[derive(Debug, Clone)]
struct Entry {
    value: serde_json::Value,
    /// Epoch milliseconds
    expires_at: i64,
}

/// Short-lived in-memory response cache keyed by string.
///
/// Sits in front of the Magio client so repeated channel/EPG/stream lookups
/// within the TTL never hit upstream. Values are stored as JSON so callers
/// stay decoupled from each other's types.
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl_ms: i64,
}

impl MemoryCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl_ms: (ttl_seconds as i64) * 1000,
        }
    }

    /// Get a typed value; expired entries read as a miss
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= chrono::Utc::now().timestamp_millis() {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Store a value under the configured TTL
    pub async fn put<T: serde::Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        let entry = Entry {
            value,
            expires_at: chrono::Utc::now().timestamp_millis() + self.ttl_ms,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
    }

    /// Drop a single key
    pub async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// Drop everything
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of entries, expired ones included
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}

impl Clone for MemoryCache {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl_ms: self.ttl_ms,
        }
    }
}
