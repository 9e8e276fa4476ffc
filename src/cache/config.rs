//! Cache Configuration
//!
//! Process-wide configuration for the caching engine, mutable at runtime via
//! an explicit merge-over update.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default memory-tier capacity (50MB)
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Default memory-tier item ceiling
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// Default time-to-live for new entries (30 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default expiry-sweep interval (5 minutes)
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Eviction strategy selecting the candidate ordering under memory pressure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently used - ascending `last_accessed_at`
    Lru,
    /// Least frequently used - ascending `access_count`
    Lfu,
    /// Insertion order - ascending `created_at`
    Fifo,
    /// Soonest to expire first; entries without a TTL sort last
    Ttl,
    /// Composite score blending frequency, recency, priority, and size
    Adaptive,
}

impl Default for EvictionStrategy {
    fn default() -> Self {
        EvictionStrategy::Adaptive
    }
}

impl std::fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EvictionStrategy::Lru => "lru",
            EvictionStrategy::Lfu => "lfu",
            EvictionStrategy::Fifo => "fifo",
            EvictionStrategy::Ttl => "ttl",
            EvictionStrategy::Adaptive => "adaptive",
        };
        write!(f, "{}", name)
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum memory-tier size in bytes
    pub max_size_bytes: u64,
    /// Maximum memory-tier item count
    pub max_items: usize,
    /// TTL applied to entries written without an explicit one
    pub default_ttl: Option<Duration>,
    /// Eviction strategy
    pub strategy: EvictionStrategy,
    /// Enable predictive preloading
    pub enable_preloading: bool,
    /// Enable compression of oversized values
    pub enable_compression: bool,
    /// Enable the persistent mirror for high-priority entries
    pub enable_persistence: bool,
    /// Expiry-sweep interval
    pub cleanup_interval: Duration,
    /// Reserved for future admission heuristics; not read by any component
    pub preload_threshold: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_items: DEFAULT_MAX_ITEMS,
            default_ttl: Some(DEFAULT_TTL),
            strategy: EvictionStrategy::default(),
            enable_preloading: true,
            enable_compression: true,
            enable_persistence: true,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            preload_threshold: 0.7,
        }
    }
}

impl CacheConfig {
    /// Merge an update over the current configuration
    ///
    /// Fields absent from the update keep their current values.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(mb) = update.max_size_mb {
            self.max_size_bytes = mb * 1024 * 1024;
        }
        if let Some(max_items) = update.max_items {
            self.max_items = max_items;
        }
        if let Some(default_ttl) = update.default_ttl {
            self.default_ttl = default_ttl;
        }
        if let Some(strategy) = update.strategy {
            self.strategy = strategy;
        }
        if let Some(enabled) = update.enable_preloading {
            self.enable_preloading = enabled;
        }
        if let Some(enabled) = update.enable_compression {
            self.enable_compression = enabled;
        }
        if let Some(enabled) = update.enable_persistence {
            self.enable_persistence = enabled;
        }
        if let Some(interval) = update.cleanup_interval {
            self.cleanup_interval = interval;
        }
        if let Some(threshold) = update.preload_threshold {
            self.preload_threshold = threshold;
        }
    }
}

/// Partial configuration update
///
/// Every field is optional; `max_size_mb` is accepted in megabytes at this
/// surface and converted to bytes on merge. `default_ttl` is doubly optional
/// so an update can explicitly clear the default (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub max_size_mb: Option<u64>,
    pub max_items: Option<usize>,
    pub default_ttl: Option<Option<Duration>>,
    pub strategy: Option<EvictionStrategy>,
    pub enable_preloading: Option<bool>,
    pub enable_compression: Option<bool>,
    pub enable_persistence: Option<bool>,
    pub cleanup_interval: Option<Duration>,
    pub preload_threshold: Option<f64>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.max_items, 1000);
        assert_eq!(config.strategy, EvictionStrategy::Adaptive);
        assert!(config.enable_preloading);
        assert!(config.enable_compression);
        assert!(config.enable_persistence);
    }

    #[test]
    fn test_apply_merges_over_current() {
        let mut config = CacheConfig::default();

        config.apply(ConfigUpdate {
            max_size_mb: Some(10),
            strategy: Some(EvictionStrategy::Lru),
            ..Default::default()
        });

        assert_eq!(config.max_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.strategy, EvictionStrategy::Lru);
        // Untouched fields keep their values
        assert_eq!(config.max_items, 1000);
        assert!(config.enable_compression);
    }

    #[test]
    fn test_apply_can_clear_default_ttl() {
        let mut config = CacheConfig::default();
        assert!(config.default_ttl.is_some());

        config.apply(ConfigUpdate {
            default_ttl: Some(None),
            ..Default::default()
        });

        assert!(config.default_ttl.is_none());
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut config = CacheConfig::default();
        let before = config.clone();

        config.apply(ConfigUpdate::default());

        assert_eq!(config.max_size_bytes, before.max_size_bytes);
        assert_eq!(config.strategy, before.strategy);
        assert_eq!(config.cleanup_interval, before.cleanup_interval);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(format!("{}", EvictionStrategy::Lru), "lru");
        assert_eq!(format!("{}", EvictionStrategy::Adaptive), "adaptive");
    }
}
