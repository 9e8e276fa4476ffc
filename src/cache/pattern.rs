//! Access Pattern Tracking
//!
//! Per-key frequency/recency ledger feeding the adaptive eviction score and
//! the preload predictor. Patterns outlive their cache entries: eviction and
//! expiry leave them in place, and only the idle-prune sweep or an explicit
//! `delete` removes them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// Patterns idle longer than this are pruned by the maintenance sweep (24h)
pub const PATTERN_IDLE_HORIZON: Duration = Duration::from_secs(24 * 60 * 60);

/// Observed access behavior for one key
#[derive(Debug, Clone, Serialize)]
pub struct AccessPattern {
    pub frequency: u64,
    pub last_access_at: DateTime<Utc>,
    /// Mean-interval estimate, available once frequency > 1
    pub predicted_next_access_at: Option<DateTime<Utc>>,
}

/// Per-key access ledger
#[derive(Debug, Default)]
pub struct AccessPatternTracker {
    patterns: DashMap<String, AccessPattern>,
}

impl AccessPatternTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one access
    ///
    /// The first access only seeds `last_access_at`; from the second onward
    /// the predictor is recomputed as `now + (now - last_access_at)/frequency`.
    /// Continuously advancing `last_access_at` biases the estimate toward
    /// recent behavior.
    pub fn record_access(&self, key: &str) {
        let now = Utc::now();
        let mut pattern = self
            .patterns
            .entry(key.to_string())
            .or_insert_with(|| AccessPattern {
                frequency: 0,
                last_access_at: now,
                predicted_next_access_at: None,
            });

        pattern.frequency += 1;
        if pattern.frequency > 1 {
            let interval = now - pattern.last_access_at;
            pattern.predicted_next_access_at =
                Some(now + interval / pattern.frequency as i32);
        }
        pattern.last_access_at = now;
    }

    /// Look up a key's pattern
    pub fn get(&self, key: &str) -> Option<AccessPattern> {
        self.patterns.get(key).map(|p| p.value().clone())
    }

    /// Remove a key's pattern (explicit delete path)
    pub fn remove(&self, key: &str) -> bool {
        self.patterns.remove(key).is_some()
    }

    /// Drop patterns idle longer than `max_idle`, returning how many went
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let horizon = chrono::Duration::from_std(max_idle)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        let cutoff = Utc::now() - horizon;

        let before = self.patterns.len();
        self.patterns.retain(|_, p| p.last_access_at >= cutoff);
        before - self.patterns.len()
    }

    /// Per-key frequencies, for diagnostics export
    pub fn frequencies(&self) -> Vec<(String, u64)> {
        self.patterns
            .iter()
            .map(|p| (p.key().clone(), p.value().frequency))
            .collect()
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the tracker is empty
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.patterns.clear();
    }
}

// =============================================================================
// Tests
// =============================================================================
