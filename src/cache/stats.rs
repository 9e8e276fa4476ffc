//! Cache Statistics Collection
//!
//! Running counters mutated by every other component, exposed through a pure
//! snapshot accessor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Statistics collector
///
/// Plain atomics; safe to share behind an `Arc` and mutate from any task.
/// Average access latency uses an exponential moving average so a snapshot
/// never has to walk per-operation samples.
#[derive(Debug, Default)]
pub struct StatsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    preloads: AtomicU64,
    total_items: AtomicU64,
    total_size_bytes: AtomicU64,
    // Microseconds, EMA-smoothed
    access_time_us: AtomicU64,
}

impl StatsCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preload(&self) {
        self.preloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Refresh tier usage after a mutating operation
    pub fn update_usage(&self, size_bytes: u64, items: u64) {
        self.total_size_bytes.store(size_bytes, Ordering::Relaxed);
        self.total_items.store(items, Ordering::Relaxed);
    }

    /// Fold one access latency sample into the moving average
    pub fn record_access_time(&self, duration: Duration) {
        let new_us = duration.as_micros() as u64;
        let alpha = 0.1; // EMA smoothing factor

        loop {
            let current = self.access_time_us.load(Ordering::Relaxed);
            let updated = if current == 0 {
                new_us
            } else {
                ((1.0 - alpha) * current as f64 + alpha * new_us as f64) as u64
            };

            if self
                .access_time_us
                .compare_exchange_weak(current, updated, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                break;
            }
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn preloads(&self) -> u64 {
        self.preloads.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage; 0 when no lookups have happened
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total * 100.0
        }
    }

    /// Snapshot all counters
    pub fn snapshot(&self, max_size_bytes: u64) -> CacheStats {
        let total_size = self.total_size_bytes.load(Ordering::Relaxed);
        let memory_usage_pct = if max_size_bytes == 0 {
            0.0
        } else {
            total_size as f64 / max_size_bytes as f64 * 100.0
        };

        CacheStats {
            total_items: self.total_items.load(Ordering::Relaxed),
            total_size_bytes: total_size,
            hit_count: self.hits(),
            miss_count: self.misses(),
            hit_rate: self.hit_rate(),
            eviction_count: self.evictions(),
            preload_count: self.preloads(),
            average_access_time: Duration::from_micros(self.access_time_us.load(Ordering::Relaxed)),
            memory_usage_pct,
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.preloads.store(0, Ordering::Relaxed);
        self.access_time_us.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time statistics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_items: u64,
    pub total_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    /// hits / (hits + misses) * 100
    pub hit_rate: f64,
    pub eviction_count: u64,
    pub preload_count: u64,
    /// EMA-smoothed access latency
    pub average_access_time: Duration,
    /// total_size_bytes / max_size_bytes * 100
    pub memory_usage_pct: f64,
}

// =============================================================================
// Tests
// =============================================================================
