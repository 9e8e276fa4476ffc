//! Memory Tier
//!
//! The fast in-process store: a sharded map with byte-size accounting.
//! Per-key operations are atomic; cross-key walks (eviction, bulk deletes,
//! diagnostics) work from cloned projections so no shard lock is held while
//! entries are removed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::entry::CacheEntry;

/// Lightweight projection of an entry, for ranking and diagnostics
#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
    pub size_bytes: u64,
    pub priority: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub tags: HashSet<String>,
    pub source: String,
}

impl From<&CacheEntry> for EntryMeta {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.clone(),
            created_at: entry.created_at,
            last_accessed_at: entry.last_accessed_at,
            access_count: entry.access_count,
            size_bytes: entry.size_bytes,
            priority: entry.priority,
            expires_at: entry.expires_at(),
            tags: entry.tags.clone(),
            source: entry.metadata.source.clone(),
        }
    }
}

/// In-memory tier with size accounting
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: DashMap<String, CacheEntry>,
    current_size: AtomicU64,
}

impl MemoryTier {
    /// Create an empty tier
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of an entry
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Mutate an entry in place, returning the closure's result
    pub fn with_entry_mut<F, R>(&self, key: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut CacheEntry) -> R,
    {
        self.entries.get_mut(key).map(|mut e| f(e.value_mut()))
    }

    /// Insert or replace an entry, returning the displaced one
    pub fn insert(&self, entry: CacheEntry) -> Option<CacheEntry> {
        let size = entry.size_bytes;
        let old = self.entries.insert(entry.key.clone(), entry);

        match &old {
            Some(old_entry) => {
                let old_size = old_entry.size_bytes;
                if size > old_size {
                    self.current_size.fetch_add(size - old_size, Ordering::Relaxed);
                } else {
                    self.current_size.fetch_sub(old_size - size, Ordering::Relaxed);
                }
            }
            None => {
                self.current_size.fetch_add(size, Ordering::Relaxed);
            }
        }

        old
    }

    /// Remove an entry
    pub fn remove(&self, key: &str) -> Option<CacheEntry> {
        let (_, entry) = self.entries.remove(key)?;
        self.current_size
            .fetch_sub(entry.size_bytes, Ordering::Relaxed);
        Some(entry)
    }

    /// Check membership
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Current size in bytes
    pub fn size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the tier is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All live keys
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Metadata projection of every entry
    pub fn entries_meta(&self) -> Vec<EntryMeta> {
        self.entries.iter().map(|e| EntryMeta::from(e.value())).collect()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
        self.current_size.store(0, Ordering::Relaxed);
    }
}

// =============================================================================
// Tests
// =============================================================================
