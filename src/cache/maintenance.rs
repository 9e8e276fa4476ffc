//! Background Maintenance
//!
//! Expiry, memory-pressure, and preload sweeps run as cancelable tokio tasks
//! owned by a `MaintenanceHandle`. The handle tears everything down on
//! `shutdown()` (or cancels on drop), so background work never leaks across
//! store lifecycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::store::CacheStore;

/// Memory-pressure poll interval
pub const PRESSURE_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Preload sweep interval
pub const PRELOAD_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Used-heap ratio above which the pressure sweep evicts
pub const PRESSURE_RATIO_THRESHOLD: f64 = 0.9;

/// Host memory telemetry consulted by the pressure sweep
pub trait MemoryTelemetry: Send + Sync {
    /// Used-heap ratio in `[0, 1]`; `None` when unavailable
    fn used_ratio(&self) -> Option<f64>;
}

/// Owner of the background sweep tasks
pub struct MaintenanceHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Spawn the sweeps against a store
    ///
    /// The expiry interval is re-read from the store's config every cycle, so
    /// `update_config` changes take effect on the next tick. Pass `None`
    /// telemetry to disable the pressure sweep's eviction (it still polls).
    pub fn spawn(store: CacheStore, telemetry: Option<Arc<dyn MemoryTelemetry>>) -> Self {
        let token = CancellationToken::new();
        let mut tasks = Vec::new();

        // Expiry sweep
        {
            let store = store.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    let interval = store.config().cleanup_interval;
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(interval) => {
                            store.run_expiry_sweep().await;
                        }
                    }
                }
            }));
        }

        // Memory-pressure sweep
        {
            let store = store.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(PRESSURE_POLL_INTERVAL) => {
                            let Some(telemetry) = telemetry.as_ref() else { continue };
                            if let Some(ratio) = telemetry.used_ratio() {
                                if ratio > PRESSURE_RATIO_THRESHOLD {
                                    let freed = store.shed_memory_pressure();
                                    warn!(ratio, freed, "memory pressure eviction");
                                }
                            }
                        }
                    }
                }
            }));
        }

        // Preload sweep
        {
            let store = store.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(PRELOAD_SWEEP_INTERVAL) => {
                            store.trigger_preload(None).await;
                        }
                    }
                }
            }));
        }

        Self { token, tasks }
    }

    /// Cancel the sweeps and wait for them to finish
    pub async fn shutdown(mut self) {
        self.token.cancel();
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                debug!(%err, "maintenance task join failed");
            }
        }
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        // Best effort if shutdown() was never awaited
        self.token.cancel();
    }
}

impl std::fmt::Debug for MaintenanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceHandle")
            .field("tasks", &self.tasks.len())
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
