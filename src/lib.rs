//! Rechner-Cache - Adaptive Service-Layer Caching Engine
//!
//! A bounded, strategy-driven cache for application service layers: given a
//! stream of read/write requests keyed by opaque strings, it maintains a
//! working set of JSON-compatible values in fast storage, decides what to
//! evict under memory pressure, mirrors high-priority items to a slower
//! durable tier, and opportunistically warms the cache ahead of predicted
//! demand.
//!
//! # Quick start
//!
//! ```no_run
//! use rechner_cache::{CacheConfig, CacheStore};
//! use serde_json::json;
//!
//! # async fn example() -> rechner_cache::Result<()> {
//! let store = CacheStore::with_config(CacheConfig::default());
//! store.init().await;
//!
//! store.set("zinses:calc:42", json!({"rate": 3.5})).await?;
//! let value = store.get("zinses:calc:42").await?;
//! assert!(value.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`cache`] - The caching engine: store, tiers, eviction, preloading
//! - [`error`] - Error types

pub mod cache;
pub mod error;

// Re-export commonly used types
pub use cache::{
    CacheConfig, CacheSnapshot, CacheStats, CacheStore, ConfigUpdate, EvictionStrategy,
    InMemoryBackend, KeyPattern, MaintenanceHandle, MemoryTelemetry, PersistenceBackend,
    PreloadRule, SetOptions,
};
pub use error::{Error, Result};
