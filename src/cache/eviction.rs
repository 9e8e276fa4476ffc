//! Eviction Engine
//!
//! Pure ranking + removal: orders memory-tier entries under the configured
//! strategy and removes them until the requested space is freed or the
//! ordering is exhausted. Never fails; the caller proceeds with admission
//! regardless of how much was actually freed.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::config::EvictionStrategy;
use super::stats::StatsCollector;
use super::tier::{EntryMeta, MemoryTier};

// Fixed weights for the adaptive composite score; not user-configurable.
const FREQUENCY_WEIGHT: f64 = 0.3;
const RECENCY_WEIGHT: f64 = 0.3;
const PRIORITY_WEIGHT: f64 = 0.3;
const SIZE_WEIGHT: f64 = 0.1;

/// Strategy-driven eviction
#[derive(Debug, Default)]
pub struct EvictionEngine;

impl EvictionEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }

    /// Evict entries until `required_space` bytes are freed
    ///
    /// Returns the number of bytes actually freed, which may fall short when
    /// the tier empties first.
    pub fn evict(
        &self,
        tier: &MemoryTier,
        strategy: EvictionStrategy,
        required_space: u64,
        stats: &StatsCollector,
    ) -> u64 {
        let candidates = Self::rank(tier.entries_meta(), strategy, Utc::now());

        let mut freed = 0u64;
        for meta in candidates {
            if freed >= required_space {
                break;
            }
            if let Some(removed) = tier.remove(&meta.key) {
                freed += removed.size_bytes;
                stats.record_eviction();
                debug!(key = %meta.key, size = removed.size_bytes, %strategy, "evicted entry");
            }
        }

        freed
    }

    /// Order candidates most-evictable first
    fn rank(
        mut candidates: Vec<EntryMeta>,
        strategy: EvictionStrategy,
        now: DateTime<Utc>,
    ) -> Vec<EntryMeta> {
        match strategy {
            EvictionStrategy::Lru => {
                candidates.sort_by_key(|m| m.last_accessed_at);
            }
            EvictionStrategy::Lfu => {
                candidates.sort_by_key(|m| m.access_count);
            }
            EvictionStrategy::Fifo => {
                candidates.sort_by_key(|m| m.created_at);
            }
            EvictionStrategy::Ttl => {
                // Soonest to expire first; entries without a TTL last
                candidates.sort_by_key(|m| {
                    m.expires_at
                        .map(|t| t.timestamp_millis())
                        .unwrap_or(i64::MAX)
                });
            }
            EvictionStrategy::Adaptive => {
                candidates.sort_by(|a, b| {
                    Self::adaptive_score(a, now)
                        .partial_cmp(&Self::adaptive_score(b, now))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }
        candidates
    }

    /// Composite adaptive score; lower = evicted first
    pub fn adaptive_score(meta: &EntryMeta, now: DateTime<Utc>) -> f64 {
        let age_sec = (now - meta.created_at).num_seconds().max(1) as f64;
        let idle_sec = (now - meta.last_accessed_at).num_seconds().max(1) as f64;

        let frequency_score = meta.access_count as f64 / age_sec;
        let recency_score = 1.0 / idle_sec;
        let priority_score = meta.priority as f64;
        let size_score = 1.0 / (meta.size_bytes as f64 / 1024.0).max(1.0);

        FREQUENCY_WEIGHT * frequency_score
            + RECENCY_WEIGHT * recency_score
            + PRIORITY_WEIGHT * priority_score
            + SIZE_WEIGHT * size_score
    }
}

// =============================================================================
// Tests
// =============================================================================
