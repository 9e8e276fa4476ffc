//! Cache Entry Types
//!
//! The per-key record held by the memory tier, plus the options accepted by
//! write operations.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provenance carried per entry
///
/// Exported for diagnostics; never consulted by eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryProvenance {
    /// Origin of the value ("application", "preload", ...)
    pub source: String,
    /// Producer version tag
    pub version: String,
    /// Keys this value was derived from
    pub dependencies: Vec<String>,
    /// How long the value took to compute, when known
    pub computation_time: Option<Duration>,
}

impl Default for EntryProvenance {
    fn default() -> Self {
        Self {
            source: "application".to_string(),
            version: "1".to_string(),
            dependencies: Vec::new(),
            computation_time: None,
        }
    }
}

/// One live cache entry
///
/// `value` may hold the compressed envelope rather than the caller's value;
/// reads decompress transparently. `access_count` starts at 1 and resets to 1
/// when the key is overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
    pub size_bytes: u64,
    pub ttl: Option<Duration>,
    pub priority: i32,
    pub tags: HashSet<String>,
    pub metadata: EntryProvenance,
}

impl CacheEntry {
    /// Build a new entry from a write operation
    pub fn new(
        key: impl Into<String>,
        value: Value,
        size_bytes: u64,
        ttl: Option<Duration>,
        options: &SetOptions,
    ) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            value,
            created_at: now,
            last_accessed_at: now,
            access_count: 1,
            size_bytes,
            ttl,
            priority: options.priority.unwrap_or(1),
            tags: options.tags.clone(),
            metadata: EntryProvenance {
                source: options
                    .source
                    .clone()
                    .unwrap_or_else(|| "application".to_string()),
                version: options.version.clone().unwrap_or_else(|| "1".to_string()),
                dependencies: options.dependencies.clone(),
                computation_time: options.computation_time,
            },
        }
    }

    /// Instant at which the entry expires, if it has a TTL
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = self.ttl?;
        let ttl = chrono::Duration::from_std(ttl).ok()?;
        self.created_at.checked_add_signed(ttl)
    }

    /// Check if the entry's TTL has elapsed
    pub fn is_expired(&self) -> bool {
        match self.expires_at() {
            Some(deadline) => Utc::now() > deadline,
            None => false,
        }
    }

    /// Record a successful read
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Utc::now();
    }
}

/// Options accepted by `set`
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// Overrides the configured default TTL
    pub ttl: Option<Duration>,
    /// Eviction bias and persistence gate (default 1)
    pub priority: Option<i32>,
    /// Group labels for bulk invalidation
    pub tags: HashSet<String>,
    /// Provenance source
    pub source: Option<String>,
    /// Provenance version
    pub version: Option<String>,
    /// Provenance dependencies
    pub dependencies: Vec<String>,
    /// Provenance computation time
    pub computation_time: Option<Duration>,
}

impl SetOptions {
    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Set the provenance source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
