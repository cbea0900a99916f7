//! In-memory flow store
//!
//! Records live for the lifetime of the process and are lost on shutdown.
//! All mutations go through a single write lock, so each upsert observes
//! and replaces the stored record in one step.

use crate::error::{Result, StoreError};
use crate::flow_store::FlowStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fd_core::{FlowCandidate, FlowRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct MemoryFlowStore {
    flows: RwLock<HashMap<String, FlowRecord>>,
    clock: Clock,
}

impl MemoryFlowStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Create a store that reads time from `clock` instead of the system.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            flows: RwLock::new(HashMap::new()),
            clock: Arc::new(clock),
        }
    }

    fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl Default for MemoryFlowStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `updatedAt` must move strictly forward even when the clock has not.
fn next_update_time(now: DateTime<Utc>, previous: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn list(&self) -> Result<Vec<FlowRecord>> {
        let flows = self.flows.read().await;
        let mut records: Vec<FlowRecord> = flows.values().cloned().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<FlowRecord>> {
        Ok(self.flows.read().await.get(id).cloned())
    }

    async fn upsert(&self, mut candidate: FlowCandidate) -> Result<FlowRecord> {
        let id = candidate
            .requested_id()
            .map(str::to_string)
            .unwrap_or_else(Self::generate_id);
        let expected = candidate.expected_updated_at.take();
        let now = (self.clock)();

        let mut flows = self.flows.write().await;
        let existing = flows.get(&id);

        if let Some(expected) = expected {
            if existing.map(|r| r.updated_at) != Some(expected) {
                debug!(id = %id, "Rejecting flow upsert with stale token");
                return Err(StoreError::Conflict { id });
            }
        }

        let record = match existing {
            Some(current) => {
                let created_at = current.created_at;
                let updated_at = next_update_time(now, current.updated_at);
                debug!(id = %id, "Replacing flow");
                candidate.into_record(id.clone(), created_at, updated_at)
            }
            None => {
                let created_at = candidate.created_at.unwrap_or(now);
                debug!(id = %id, "Creating flow");
                candidate.into_record(id.clone(), created_at, now)
            }
        };

        flows.insert(id, record.clone());
        Ok(record)
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.flows.write().await.remove(id).is_some();
        debug!(id = %id, removed, "Remove flow");
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.flows.read().await.len())
    }
}
