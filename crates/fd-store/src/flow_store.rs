use crate::error::Result;
use async_trait::async_trait;
use fd_core::{FlowCandidate, FlowRecord};

/// Storage backend for flow documents.
///
/// Each call is atomic on its own; there are no multi-call transactions.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// All current records, as one consistent snapshot.
    async fn list(&self) -> Result<Vec<FlowRecord>>;

    async fn get(&self, id: &str) -> Result<Option<FlowRecord>>;

    /// Create or replace the record named by `candidate.id`, generating an
    /// id when none is given. `createdAt` of an existing record is kept.
    async fn upsert(&self, candidate: FlowCandidate) -> Result<FlowRecord>;

    /// Returns whether a record was actually removed.
    async fn remove(&self, id: &str) -> Result<bool>;

    async fn len(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
