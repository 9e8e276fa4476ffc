//! Persistent Tier
//!
//! Best-effort durable mirror for high-priority entries. The whole mirror is
//! serialized as one JSON blob under a well-known key on every qualifying
//! write and loaded once at startup. I/O failures are logged and degrade to
//! "no persisted data" / "save skipped"; they never reach `get`/`set` callers.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::Result;

use super::entry::CacheEntry;

/// Well-known backend key under which the mirror blob is stored
pub const PERSIST_NAMESPACE_KEY: &str = "rechner-cache:persistent";

/// Flat string-keyed durable store
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Load a blob
    async fn load(&self, namespace_key: &str) -> Result<Option<String>>;

    /// Store a blob
    async fn save(&self, namespace_key: &str, json: &str) -> Result<()>;

    /// Remove a blob
    async fn remove(&self, namespace_key: &str) -> Result<()>;
}

/// In-memory backend for tests and hosts without durable storage
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blobs: DashMap<String, String>,
}

impl InMemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw blob access, for test assertions
    pub fn raw(&self, namespace_key: &str) -> Option<String> {
        self.blobs.get(namespace_key).map(|b| b.value().clone())
    }
}

#[async_trait]
impl PersistenceBackend for InMemoryBackend {
    async fn load(&self, namespace_key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(namespace_key).map(|b| b.value().clone()))
    }

    async fn save(&self, namespace_key: &str, json: &str) -> Result<()> {
        self.blobs.insert(namespace_key.to_string(), json.to_string());
        Ok(())
    }

    async fn remove(&self, namespace_key: &str) -> Result<()> {
        self.blobs.remove(namespace_key);
        Ok(())
    }
}

/// Mirror of high-priority entries backed by a durable store
pub struct PersistentTier {
    mirror: DashMap<String, CacheEntry>,
    backend: Option<Arc<dyn PersistenceBackend>>,
}

impl PersistentTier {
    /// Create a tier; `None` backend disables durability but keeps the mirror
    pub fn new(backend: Option<Arc<dyn PersistenceBackend>>) -> Self {
        Self {
            mirror: DashMap::new(),
            backend,
        }
    }

    /// Load the persisted blob once at startup; failures start empty
    pub async fn load_initial(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        match backend.load(PERSIST_NAMESPACE_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<CacheEntry>>(&json) {
                Ok(entries) => {
                    let count = entries.len();
                    for entry in entries {
                        self.mirror.insert(entry.key.clone(), entry);
                    }
                    debug!(count, "persistent tier loaded");
                }
                Err(err) => {
                    warn!(%err, "persisted snapshot unreadable, starting empty");
                }
            },
            Ok(None) => {}
            Err(err) => {
                warn!(%err, "persistent tier load failed, starting empty");
            }
        }
    }

    /// Get a clone of a mirrored entry
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.mirror.get(key).map(|e| e.value().clone())
    }

    /// Insert or replace a mirrored entry
    pub fn insert(&self, entry: CacheEntry) {
        self.mirror.insert(entry.key.clone(), entry);
    }

    /// Remove a mirrored entry
    pub fn remove(&self, key: &str) -> bool {
        self.mirror.remove(key).is_some()
    }

    /// Check membership
    pub fn contains(&self, key: &str) -> bool {
        self.mirror.contains_key(key)
    }

    /// Number of mirrored entries
    pub fn len(&self) -> usize {
        self.mirror.len()
    }

    /// Check if the mirror is empty
    pub fn is_empty(&self) -> bool {
        self.mirror.is_empty()
    }

    /// Drop all mirrored entries (does not touch the backend; call `flush`)
    pub fn clear(&self) {
        self.mirror.clear();
    }

    /// Write the whole mirror to the backend as one JSON blob
    ///
    /// Best-effort: serialization or I/O failures are logged and swallowed.
    pub async fn flush(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        let entries: Vec<CacheEntry> = self.mirror.iter().map(|e| e.value().clone()).collect();
        match serde_json::to_string(&entries) {
            Ok(json) => {
                if let Err(err) = backend.save(PERSIST_NAMESPACE_KEY, &json).await {
                    warn!(%err, "persistent tier save skipped");
                }
            }
            Err(err) => {
                warn!(%err, "persistent tier serialization failed, save skipped");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::SetOptions;
    use crate::error::Error;
    use serde_json::json;

    fn entry(key: &str) -> CacheEntry {
        CacheEntry::new(key, json!({"v": key}), 10, None, &SetOptions::default())
    }

    #[tokio::test]
    async fn test_in_memory_backend_roundtrip() {
        let backend = InMemoryBackend::new();

        backend.save("ns", "[1,2,3]").await.unwrap();
        assert_eq!(backend.load("ns").await.unwrap(), Some("[1,2,3]".to_string()));

        backend.remove("ns").await.unwrap();
        assert_eq!(backend.load("ns").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_and_reload() {
        let backend = Arc::new(InMemoryBackend::new());

        let tier = PersistentTier::new(Some(backend.clone()));
        tier.insert(entry("a"));
        tier.insert(entry("b"));
        tier.flush().await;

        // A second tier over the same backend sees the blob
        let restored = PersistentTier::new(Some(backend));
        restored.load_initial().await;

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.get("a").unwrap().value, json!({"v": "a"}));
    }

    #[tokio::test]
    async fn test_corrupt_blob_starts_empty() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.save(PERSIST_NAMESPACE_KEY, "not json").await.unwrap();

        let tier = PersistentTier::new(Some(backend));
        tier.load_initial().await;

        assert!(tier.is_empty());
    }

    #[tokio::test]
    async fn test_no_backend_is_inert() {
        let tier = PersistentTier::new(None);
        tier.insert(entry("a"));
        tier.load_initial().await;
        tier.flush().await;

        assert_eq!(tier.len(), 1);
    }

    struct FailingBackend;

    #[async_trait]
    impl PersistenceBackend for FailingBackend {
        async fn load(&self, _ns: &str) -> Result<Option<String>> {
            Err(Error::Persistence("storage offline".to_string()))
        }

        async fn save(&self, _ns: &str, _json: &str) -> Result<()> {
            Err(Error::Persistence("storage offline".to_string()))
        }

        async fn remove(&self, _ns: &str) -> Result<()> {
            Err(Error::Persistence("storage offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_backend_failures_are_swallowed() {
        let tier = PersistentTier::new(Some(Arc::new(FailingBackend)));

        // Neither load nor flush may propagate the error
        tier.load_initial().await;
        tier.insert(entry("a"));
        tier.flush().await;

        assert_eq!(tier.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_then_flush_persists_empty() {
        let backend = Arc::new(InMemoryBackend::new());
        let tier = PersistentTier::new(Some(backend.clone()));

        tier.insert(entry("a"));
        tier.flush().await;
        tier.clear();
        tier.flush().await;

        assert_eq!(backend.raw(PERSIST_NAMESPACE_KEY), Some("[]".to_string()));
    }
}
