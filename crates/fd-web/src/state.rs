//! Application State
//!
//! Shared across all handlers. The flow store is injected so a persistent
//! backend can replace the in-memory one without touching the handlers.

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use fd_store::{FlowStore, MemoryFlowStore};

/// Application state shared across all handlers
pub struct AppState {
    /// Flow document store
    pub store: Arc<dyn FlowStore>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn FlowStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }

    /// State backed by a fresh, non-durable in-memory store
    pub fn in_memory() -> Self {
        info!("Using in-memory flow store (flows are lost on restart)");
        Self::new(Arc::new(MemoryFlowStore::new()))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
