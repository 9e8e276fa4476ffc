//! Capacity Manager
//!
//! Pre-admission check against the configured byte and item ceilings. Runs
//! before an item is inserted, so a single admission whose own size fits the
//! ceiling never drives the tier above it.

use tracing::{debug, warn};

use super::config::CacheConfig;
use super::eviction::EvictionEngine;
use super::stats::StatsCollector;
use super::tier::MemoryTier;

/// Admission gatekeeper
#[derive(Debug, Default)]
pub struct CapacityManager;

impl CapacityManager {
    /// Create a new manager
    pub fn new() -> Self {
        Self
    }

    /// Make room for a prospective insertion
    ///
    /// Returns `false` when the item can never fit (size exceeds the byte
    /// ceiling outright) and must be rejected. Otherwise runs best-effort
    /// eviction when a ceiling would be crossed and returns `true`; admission
    /// proceeds even when eviction could not free the full amount.
    pub fn ensure_capacity(
        &self,
        tier: &MemoryTier,
        config: &CacheConfig,
        new_item_size: u64,
        eviction: &EvictionEngine,
        stats: &StatsCollector,
    ) -> bool {
        if new_item_size > config.max_size_bytes {
            warn!(
                size = new_item_size,
                max = config.max_size_bytes,
                "item exceeds cache capacity, rejected"
            );
            return false;
        }

        let current_size = tier.size();
        let over_bytes = current_size + new_item_size > config.max_size_bytes;
        let over_items = tier.len() >= config.max_items;

        if over_bytes || over_items {
            let freed = eviction.evict(tier, config.strategy, new_item_size, stats);
            debug!(
                freed,
                required = new_item_size,
                over_bytes,
                over_items,
                "pre-admission eviction"
            );
        }

        true
    }
}

// =============================================================================
// Tests
// =============================================================================
