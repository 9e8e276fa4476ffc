//! Cache Store - Orchestrator
//!
//! The public-facing component. Composes the memory tier, persistent mirror,
//! capacity/eviction policy, access-pattern ledger, preload engine, and stats
//! into the read/write surface, bulk operations, and maintenance entry points.
//!
//! # Concurrency
//!
//! Per-key map operations are atomic; no lock is held across an await point.
//! Two overlapping async writes to the *same* key can interleave their
//! persistence-mirroring steps, so the final persisted value may lag the final
//! in-memory value. Accepted: the mirror is best-effort by design.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

use super::capacity::CapacityManager;
use super::compression::CompressionCodec;
use super::config::{CacheConfig, ConfigUpdate};
use super::entry::{CacheEntry, SetOptions};
use super::eviction::EvictionEngine;
use super::pattern::{AccessPatternTracker, PATTERN_IDLE_HORIZON};
use super::persistence::{PersistenceBackend, PersistentTier};
use super::preload::{
    KeyPattern, PreloadContext, PreloadEngine, PreloadRule, MAX_CANDIDATES_PER_RULE, PRELOAD_SOURCE,
    PRELOAD_TAG,
};
use super::stats::{CacheStats, StatsCollector};
use super::tier::MemoryTier;

/// Priority above which entries are mirrored to the persistent tier
pub const PERSIST_PRIORITY_THRESHOLD: i32 = 5;

struct StoreInner {
    tier: MemoryTier,
    persistent: PersistentTier,
    patterns: AccessPatternTracker,
    preload: PreloadEngine,
    stats: StatsCollector,
    config: RwLock<CacheConfig>,
    codec: CompressionCodec,
    capacity: CapacityManager,
    eviction: EvictionEngine,
}

/// Adaptive cache store
///
/// Cheap to clone; clones share all state. Construct one per logical cache:
/// any process-wide single-instance requirement belongs to the host
/// application's composition, not to this type.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

impl CacheStore {
    /// Create a store with default configuration and no persistence backend
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a store with custom configuration and no persistence backend
    pub fn with_config(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a store mirrored to a durable backend
    pub fn with_backend(config: CacheConfig, backend: Arc<dyn PersistenceBackend>) -> Self {
        Self::build(config, Some(backend))
    }

    fn build(config: CacheConfig, backend: Option<Arc<dyn PersistenceBackend>>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tier: MemoryTier::new(),
                persistent: PersistentTier::new(backend),
                patterns: AccessPatternTracker::new(),
                preload: PreloadEngine::new(),
                stats: StatsCollector::new(),
                config: RwLock::new(config),
                codec: CompressionCodec::new(),
                capacity: CapacityManager::new(),
                eviction: EvictionEngine::new(),
            }),
        }
    }

    /// Load the persisted mirror; call once after construction
    pub async fn init(&self) {
        let persistence_enabled = self.inner.config.read().enable_persistence;
        if persistence_enabled {
            self.inner.persistent.load_initial().await;
        }
    }

    // =========================================================================
    // Read path
    // =========================================================================

    /// Get a value
    ///
    /// Checks the memory tier, falls back to the persistent mirror (promoting
    /// on hit), and treats expired entries as misses, deleting them on sight.
    /// Fires a preload trigger in the background when preloading is enabled.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let started = Instant::now();

        if let Some(entry) = self.inner.tier.get(key) {
            if entry.is_expired() {
                self.drop_entry(key).await;
                self.inner.stats.record_miss();
                self.inner.stats.record_access_time(started.elapsed());
                self.refresh_usage();
                return Ok(None);
            }

            self.inner.tier.with_entry_mut(key, |e| e.record_access());
            self.inner.patterns.record_access(key);
            self.inner.stats.record_hit();
            self.inner.stats.record_access_time(started.elapsed());

            let value = self.materialize(&entry)?;
            self.maybe_fire_preload(key);
            return Ok(Some(value));
        }

        if let Some(entry) = self.inner.persistent.get(key) {
            if entry.is_expired() {
                self.drop_entry(key).await;
                self.inner.stats.record_miss();
                self.inner.stats.record_access_time(started.elapsed());
                return Ok(None);
            }

            // Promote through normal admission
            let mut promoted = entry;
            promoted.record_access();
            let config = self.inner.config.read().clone();
            if self.inner.capacity.ensure_capacity(
                &self.inner.tier,
                &config,
                promoted.size_bytes,
                &self.inner.eviction,
                &self.inner.stats,
            ) {
                self.inner.tier.insert(promoted.clone());
            }
            debug!(key, "promoted from persistent tier");

            self.inner.patterns.record_access(key);
            self.inner.stats.record_hit();
            self.inner.stats.record_access_time(started.elapsed());
            self.refresh_usage();

            let value = self.materialize(&promoted)?;
            self.maybe_fire_preload(key);
            return Ok(Some(value));
        }

        self.inner.stats.record_miss();
        self.inner.stats.record_access_time(started.elapsed());
        Ok(None)
    }

    /// Concurrent fan-out over `get`; absent and failed keys are omitted
    pub async fn get_multiple(&self, keys: &[String]) -> Result<HashMap<String, Value>> {
        let lookups = keys.iter().map(|key| async move {
            (key.clone(), self.get(key).await)
        });
        let results = futures::future::join_all(lookups).await;

        let mut found = HashMap::new();
        for (key, result) in results {
            match result {
                Ok(Some(value)) => {
                    found.insert(key, value);
                }
                Ok(None) => {}
                Err(err) => warn!(key = %key, %err, "bulk get failed for key"),
            }
        }
        Ok(found)
    }

    // =========================================================================
    // Write path
    // =========================================================================

    /// Set a value with default options
    pub async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.set_with_options(key, value, SetOptions::default()).await
    }

    /// Set a value
    ///
    /// Sizes the serialized value, compresses past the threshold, makes room
    /// through the capacity manager, inserts, and mirrors high-priority
    /// entries to the persistent tier. Oversized values (larger than the byte
    /// ceiling after compression) are rejected from the memory tier without
    /// error.
    pub async fn set_with_options(
        &self,
        key: &str,
        value: Value,
        options: SetOptions,
    ) -> Result<()> {
        let config = self.inner.config.read().clone();

        let mut stored = value;
        let mut size_bytes = serde_json::to_vec(&stored)?.len() as u64;

        if config.enable_compression && self.inner.codec.should_compress(size_bytes) {
            stored = self.inner.codec.compress(&stored)?;
            size_bytes = serde_json::to_vec(&stored)?.len() as u64;
        }

        if !self.inner.capacity.ensure_capacity(
            &self.inner.tier,
            &config,
            size_bytes,
            &self.inner.eviction,
            &self.inner.stats,
        ) {
            self.refresh_usage();
            return Ok(());
        }

        let ttl = options.ttl.or(config.default_ttl);
        let entry = CacheEntry::new(key, stored, size_bytes, ttl, &options);
        let mirror = config.enable_persistence && entry.priority > PERSIST_PRIORITY_THRESHOLD;

        self.inner.tier.insert(entry.clone());
        self.inner.patterns.record_access(key);

        if mirror {
            self.inner.persistent.insert(entry);
            self.inner.persistent.flush().await;
        }

        self.refresh_usage();
        Ok(())
    }

    /// Concurrent fan-out over `set`; entries succeed or fail independently
    pub async fn set_multiple(&self, entries: Vec<(String, Value, SetOptions)>) -> Result<()> {
        let writes = entries.into_iter().map(|(key, value, options)| async move {
            if let Err(err) = self.set_with_options(&key, value, options).await {
                warn!(key = %key, %err, "bulk set failed for entry");
            }
        });
        futures::future::join_all(writes).await;
        Ok(())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete a key from both tiers and the access ledger
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let removed_memory = self.inner.tier.remove(key).is_some();
        let removed_mirror = self.inner.persistent.remove(key);
        if removed_mirror {
            self.inner.persistent.flush().await;
        }
        let removed_pattern = self.inner.patterns.remove(key);

        self.refresh_usage();
        Ok(removed_memory || removed_mirror || removed_pattern)
    }

    /// Empty both tiers and the access ledger
    pub async fn clear(&self) -> Result<()> {
        self.inner.tier.clear();
        self.inner.patterns.clear();
        self.inner.persistent.clear();

        let persistence_enabled = self.inner.config.read().enable_persistence;
        if persistence_enabled {
            self.inner.persistent.flush().await;
        }

        self.refresh_usage();
        Ok(())
    }

    /// Delete every entry carrying the tag; returns the count removed
    pub async fn delete_by_tag(&self, tag: &str) -> Result<usize> {
        let matches: Vec<String> = self
            .inner
            .tier
            .entries_meta()
            .into_iter()
            .filter(|m| m.tags.contains(tag))
            .map(|m| m.key)
            .collect();

        let mut removed = 0;
        for key in &matches {
            if self.delete(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete every entry whose key matches the pattern; invalid patterns
    /// error synchronously
    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;

        let matches: Vec<String> = self
            .inner
            .tier
            .keys()
            .into_iter()
            .filter(|key| regex.is_match(key))
            .collect();

        let mut removed = 0;
        for key in &matches {
            if self.delete(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // =========================================================================
    // Preloading
    // =========================================================================

    /// Register a preload rule
    pub fn add_preload_rule(&self, rule: PreloadRule) {
        self.inner.preload.add_rule(rule);
    }

    /// Remove a preload rule
    pub fn remove_preload_rule(&self, id: &str) -> bool {
        self.inner.preload.remove_rule(id)
    }

    /// Enable or disable a preload rule
    pub fn set_preload_rule_enabled(&self, id: &str, enabled: bool) -> bool {
        self.inner.preload.set_rule_enabled(id, enabled)
    }

    /// Run the preload rules once
    ///
    /// No-op when preloading is disabled or another trigger is in flight.
    /// Enabled rules whose conditions pass run concurrently; each rule's
    /// failures are logged and isolated. Resolves after all rules settle.
    pub async fn trigger_preload(&self, context_key: Option<&str>) {
        let config = self.inner.config.read().clone();
        if !config.enable_preloading {
            return;
        }

        let Some(_guard) = self.inner.preload.begin() else {
            debug!("preload trigger skipped, already in flight");
            return;
        };

        let context = PreloadContext {
            context_key: context_key.map(|k| k.to_string()),
            total_items: self.inner.tier.len() as u64,
            hit_rate: self.inner.stats.hit_rate(),
        };

        let rules: Vec<PreloadRule> = self
            .inner
            .preload
            .enabled_rules()
            .into_iter()
            .filter(|rule| (rule.condition)(&context))
            .collect();

        let runs = rules.into_iter().map(|rule| async move {
            self.run_preload_rule(rule).await;
        });
        futures::future::join_all(runs).await;
    }

    async fn run_preload_rule(&self, rule: PreloadRule) {
        for key in self.preload_candidates(&rule) {
            if self.inner.tier.contains(&key) {
                continue;
            }

            match (rule.loader)(key.clone()).await {
                Ok(Some(value)) => {
                    let options = SetOptions::default()
                        .with_priority(rule.priority)
                        .with_tag(PRELOAD_TAG)
                        .with_source(PRELOAD_SOURCE);
                    match self.set_with_options(&key, value, options).await {
                        Ok(()) => {
                            self.inner.stats.record_preload();
                            debug!(rule = %rule.id, key = %key, "preloaded");
                        }
                        Err(err) => {
                            warn!(rule = %rule.id, key = %key, %err, "preload admission failed");
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(rule = %rule.id, key = %key, %err, "preload loader failed");
                }
            }
        }
    }

    /// Bounded candidate list for one rule
    fn preload_candidates(&self, rule: &PreloadRule) -> Vec<String> {
        match &rule.pattern {
            KeyPattern::Exact(key) => vec![key.clone()],
            KeyPattern::Regex(regex) => {
                let mut candidates: Vec<String> = Vec::new();
                for key in self.inner.tier.keys() {
                    if candidates.len() >= MAX_CANDIDATES_PER_RULE {
                        break;
                    }
                    if !regex.is_match(&key) {
                        continue;
                    }
                    if let Some(derive) = &rule.derive_related {
                        for related in derive(&key) {
                            if candidates.len() >= MAX_CANDIDATES_PER_RULE {
                                break;
                            }
                            if !candidates.contains(&related) {
                                candidates.push(related);
                            }
                        }
                    } else if !candidates.contains(&key) {
                        candidates.push(key);
                    }
                }
                candidates
            }
        }
    }

    fn maybe_fire_preload(&self, key: &str) {
        let preloading_enabled = self.inner.config.read().enable_preloading;
        if !preloading_enabled {
            return;
        }
        let store = self.clone();
        let context_key = key.to_string();
        tokio::spawn(async move {
            store.trigger_preload(Some(&context_key)).await;
        });
    }

    // =========================================================================
    // Maintenance entry points
    // =========================================================================

    /// Remove expired memory-tier entries and prune idle access patterns
    pub async fn run_expiry_sweep(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .inner
            .tier
            .entries_meta()
            .into_iter()
            .filter(|m| m.expires_at.map(|t| t <= now).unwrap_or(false))
            .map(|m| m.key)
            .collect();

        for key in &expired {
            self.inner.tier.remove(key);
        }

        let pruned = self.inner.patterns.prune_idle(PATTERN_IDLE_HORIZON);
        if !expired.is_empty() || pruned > 0 {
            debug!(expired = expired.len(), pruned, "expiry sweep");
        }

        self.refresh_usage();
        expired.len()
    }

    /// Evict the memory tier down to half the byte ceiling
    ///
    /// Called by the pressure sweep when host memory telemetry crosses its
    /// threshold. Returns the bytes freed.
    pub fn shed_memory_pressure(&self) -> u64 {
        let config = self.inner.config.read().clone();
        let target = config.max_size_bytes / 2;
        let current = self.inner.tier.size();
        if current <= target {
            return 0;
        }

        let freed = self.inner.eviction.evict(
            &self.inner.tier,
            config.strategy,
            current - target,
            &self.inner.stats,
        );
        self.refresh_usage();
        freed
    }

    // =========================================================================
    // Configuration and diagnostics
    // =========================================================================

    /// Current configuration
    pub fn config(&self) -> CacheConfig {
        self.inner.config.read().clone()
    }

    /// Merge a partial update over the current configuration
    pub fn update_config(&self, update: ConfigUpdate) {
        self.inner.config.write().apply(update);
    }

    /// Point-in-time statistics
    pub fn snapshot_stats(&self) -> CacheStats {
        self.refresh_usage();
        let max_size_bytes = self.inner.config.read().max_size_bytes;
        self.inner.stats.snapshot(max_size_bytes)
    }

    /// Reset statistics counters
    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    /// Read-only diagnostics projection; never used to restore state
    pub fn export_snapshot(&self) -> CacheSnapshot {
        let items = self
            .inner
            .tier
            .entries_meta()
            .into_iter()
            .map(|m| {
                let mut tags: Vec<String> = m.tags.into_iter().collect();
                tags.sort();
                ItemMetadata {
                    key: m.key,
                    size_bytes: m.size_bytes,
                    access_count: m.access_count,
                    last_accessed_at: m.last_accessed_at,
                    tags,
                    source: m.source,
                }
            })
            .collect();

        let mut access_patterns: Vec<AccessFrequency> = self
            .inner
            .patterns
            .frequencies()
            .into_iter()
            .map(|(key, frequency)| AccessFrequency { key, frequency })
            .collect();
        access_patterns.sort_by(|a, b| a.key.cmp(&b.key));

        CacheSnapshot {
            config: self.config(),
            stats: self.snapshot_stats(),
            items,
            access_patterns,
        }
    }

    /// Number of live memory-tier entries
    pub fn len(&self) -> usize {
        self.inner.tier.len()
    }

    /// Check if the memory tier is empty
    pub fn is_empty(&self) -> bool {
        self.inner.tier.is_empty()
    }

    /// Check memory-tier membership without access bookkeeping
    pub fn contains(&self, key: &str) -> bool {
        self.inner.tier.contains(key)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn materialize(&self, entry: &CacheEntry) -> Result<Value> {
        if CompressionCodec::is_compressed(&entry.value) {
            self.inner.codec.decompress(&entry.value)
        } else {
            Ok(entry.value.clone())
        }
    }

    /// Remove a dead entry from both tiers (expiry path; patterns survive)
    async fn drop_entry(&self, key: &str) {
        self.inner.tier.remove(key);
        if self.inner.persistent.remove(key) {
            self.inner.persistent.flush().await;
        }
    }

    fn refresh_usage(&self) {
        self.inner
            .stats
            .update_usage(self.inner.tier.size(), self.inner.tier.len() as u64);
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("items", &self.inner.tier.len())
            .field("size_bytes", &self.inner.tier.size())
            .field("mirrored", &self.inner.persistent.len())
            .finish()
    }
}

/// Per-item diagnostics record
#[derive(Debug, Clone, Serialize)]
pub struct ItemMetadata {
    pub key: String,
    pub size_bytes: u64,
    pub access_count: u64,
    pub last_accessed_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub source: String,
}

/// Per-key access frequency record
#[derive(Debug, Clone, Serialize)]
pub struct AccessFrequency {
    pub key: String,
    pub frequency: u64,
}

/// Read-only diagnostics projection
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub config: CacheConfig,
    pub stats: CacheStats,
    pub items: Vec<ItemMetadata>,
    pub access_patterns: Vec<AccessFrequency>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::EvictionStrategy;
    use serde_json::json;
    use std::time::Duration;

    fn store_with(config: CacheConfig) -> CacheStore {
        CacheStore::with_config(config)
    }

    fn plain_config() -> CacheConfig {
        CacheConfig {
            enable_preloading: false,
            enable_persistence: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = store_with(plain_config());

        store.set("k", json!({"a": 1})).await.unwrap();
        let value = store.get("k").await.unwrap();

        assert_eq!(value, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let store = store_with(plain_config());
        assert_eq!(store.get("missing").await.unwrap(), None);
        assert_eq!(store.snapshot_stats().miss_count, 1);
    }

    #[tokio::test]
    async fn test_replace_resets_access_count() {
        let store = store_with(plain_config());

        store.set("k", json!(1)).await.unwrap();
        store.get("k").await.unwrap();
        store.get("k").await.unwrap();
        store.set("k", json!(2)).await.unwrap();

        let snapshot = store.export_snapshot();
        assert_eq!(snapshot.items[0].access_count, 1);
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = store_with(plain_config());

        store.set("k", json!(1)).await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = store_with(plain_config());

        for i in 0..5 {
            store.set(&format!("k{}", i), json!(i)).await.unwrap();
        }
        store.clear().await.unwrap();

        assert!(store.is_empty());
        assert_eq!(store.snapshot_stats().total_items, 0);
    }

    #[tokio::test]
    async fn test_ttl_expiry_on_read() {
        let store = store_with(plain_config());

        store
            .set_with_options(
                "k",
                json!("short lived"),
                SetOptions::default().with_ttl(Duration::from_millis(40)),
            )
            .await
            .unwrap();

        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        // Deleted as a side effect of the expired read
        assert!(!store.contains("k"));
    }

    #[tokio::test]
    async fn test_get_multiple() {
        let store = store_with(plain_config());

        store.set("a", json!(1)).await.unwrap();
        store.set("b", json!(2)).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "missing".to_string()];
        let found = store.get_multiple(&keys).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found["a"], json!(1));
        assert_eq!(found["b"], json!(2));
    }

    #[tokio::test]
    async fn test_set_multiple() {
        let store = store_with(plain_config());

        store
            .set_multiple(vec![
                ("a".to_string(), json!(1), SetOptions::default()),
                ("b".to_string(), json!(2), SetOptions::default()),
            ])
            .await
            .unwrap();

        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_by_tag() {
        let store = store_with(plain_config());

        store
            .set_with_options("a", json!(1), SetOptions::default().with_tag("x"))
            .await
            .unwrap();
        store
            .set_with_options("b", json!(2), SetOptions::default().with_tag("x"))
            .await
            .unwrap();
        store
            .set_with_options("c", json!(3), SetOptions::default().with_tag("y"))
            .await
            .unwrap();

        let removed = store.delete_by_tag("x").await.unwrap();

        assert_eq!(removed, 2);
        assert!(!store.contains("a"));
        assert!(!store.contains("b"));
        assert!(store.contains("c"));
    }

    #[tokio::test]
    async fn test_delete_by_pattern() {
        let store = store_with(plain_config());

        store.set("zinses:calc:1", json!(1)).await.unwrap();
        store.set("zinses:calc:2", json!(2)).await.unwrap();
        store.set("zinses:chart:1", json!(3)).await.unwrap();

        let removed = store.delete_by_pattern("^zinses:calc:").await.unwrap();

        assert_eq!(removed, 2);
        assert!(store.contains("zinses:chart:1"));
    }

    #[tokio::test]
    async fn test_delete_by_pattern_invalid_regex() {
        let store = store_with(plain_config());
        assert!(store.delete_by_pattern("calc:(").await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_value_rejected_without_error() {
        let config = CacheConfig {
            max_size_bytes: 64,
            enable_compression: false,
            ..plain_config()
        };
        let store = store_with(config);

        let big = json!("x".repeat(500));
        store.set("big", big).await.unwrap();

        assert!(!store.contains("big"));
        assert_eq!(store.get("big").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let store = store_with(plain_config());

        store.set("k", json!(1)).await.unwrap();
        store.get("k").await.unwrap();
        store.get("k").await.unwrap();
        store.get("gone").await.unwrap();

        let stats = store.snapshot_stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 1);
        assert!((stats.hit_rate - 2.0 / 3.0 * 100.0).abs() < 1e-9);
        assert_eq!(stats.total_items, 1);
        assert!(stats.total_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_export_snapshot_projection() {
        let store = store_with(plain_config());

        store
            .set_with_options("k", json!(1), SetOptions::default().with_tag("t"))
            .await
            .unwrap();
        store.get("k").await.unwrap();

        let snapshot = store.export_snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].key, "k");
        assert_eq!(snapshot.items[0].tags, vec!["t".to_string()]);
        assert_eq!(snapshot.access_patterns.len(), 1);
        assert_eq!(snapshot.access_patterns[0].frequency, 2);
    }

    #[tokio::test]
    async fn test_update_config() {
        let store = store_with(plain_config());

        store.update_config(ConfigUpdate {
            strategy: Some(EvictionStrategy::Lfu),
            max_size_mb: Some(1),
            ..Default::default()
        });

        let config = store.config();
        assert_eq!(config.strategy, EvictionStrategy::Lfu);
        assert_eq!(config.max_size_bytes, 1024 * 1024);
    }

    #[tokio::test]
    async fn test_expiry_sweep() {
        let store = store_with(plain_config());

        store
            .set_with_options(
                "dead",
                json!(1),
                SetOptions::default().with_ttl(Duration::from_millis(20)),
            )
            .await
            .unwrap();
        store.set("alive", json!(2)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let swept = store.run_expiry_sweep().await;

        assert_eq!(swept, 1);
        assert!(!store.contains("dead"));
        assert!(store.contains("alive"));
    }

    #[tokio::test]
    async fn test_shed_memory_pressure() {
        let config = CacheConfig {
            max_size_bytes: 1000,
            strategy: EvictionStrategy::Fifo,
            default_ttl: None,
            ..plain_config()
        };
        let store = store_with(config);

        for i in 0..9 {
            // ~100 bytes each serialized
            store
                .set(&format!("k{}", i), json!("y".repeat(90)))
                .await
                .unwrap();
        }
        let before = store.snapshot_stats().total_size_bytes;
        assert!(before > 500);

        let freed = store.shed_memory_pressure();

        assert!(freed > 0);
        assert!(store.snapshot_stats().total_size_bytes <= 500);
    }
}
