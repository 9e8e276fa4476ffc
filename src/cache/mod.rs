//! Adaptive Caching Engine
//!
//! Bounded in-memory caching with multi-strategy eviction, TTL expiry,
//! access-pattern tracking, rule-driven predictive preloading, and a
//! best-effort persistent mirror for high-priority entries.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Cache Store                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Memory Tier          │ Persistent Mirror   │ Preload Engine     │
//! │  ┌────────────────┐   │ ┌────────────────┐  │ ┌───────────────┐  │
//! │  │ Sharded Map    │   │ │ One JSON blob  │  │ │ Rule registry │  │
//! │  │ + size ledger  │   │ │ priority > 5   │  │ │ single-flight │  │
//! │  └────────────────┘   │ └────────────────┘  │ └───────────────┘  │
//! │         │             │         │           │         │          │
//! │  Capacity Manager → Eviction Engine    Access Pattern Tracker    │
//! │  (pre-admission)    (lru/lfu/fifo/ttl/adaptive)                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - Per-key atomic map operations; no lock held across an await
//! - Capacity is enforced before admission, never corrected after
//! - Infrastructure failures degrade to cache misses; only malformed input
//!   (bad regex, corrupt compressed payload) raises
//! - Background sweeps are owned, cancelable tasks

mod capacity;
mod compression;
mod config;
mod entry;
mod eviction;
mod maintenance;
mod pattern;
mod persistence;
mod preload;
mod stats;
mod store;
mod tier;

pub use compression::{CompressionCodec, COMPRESSION_THRESHOLD_BYTES};
pub use config::{CacheConfig, ConfigUpdate, EvictionStrategy};
pub use entry::{CacheEntry, EntryProvenance, SetOptions};
pub use eviction::EvictionEngine;
pub use maintenance::{
    MaintenanceHandle, MemoryTelemetry, PRELOAD_SWEEP_INTERVAL, PRESSURE_POLL_INTERVAL,
    PRESSURE_RATIO_THRESHOLD,
};
pub use pattern::{AccessPattern, AccessPatternTracker, PATTERN_IDLE_HORIZON};
pub use persistence::{
    InMemoryBackend, PersistenceBackend, PersistentTier, PERSIST_NAMESPACE_KEY,
};
pub use preload::{
    segment_swap_deriver, ConditionFn, KeyPattern, LoaderFn, PreloadContext, PreloadEngine,
    PreloadRule, RelatedKeyFn, MAX_CANDIDATES_PER_RULE, PRELOAD_SOURCE, PRELOAD_TAG,
};
pub use stats::{CacheStats, StatsCollector};
pub use store::{
    AccessFrequency, CacheSnapshot, CacheStore, ItemMetadata, PERSIST_PRIORITY_THRESHOLD,
};
pub use tier::{EntryMeta, MemoryTier};
