//! fd-store: Flow Record Store
//!
//! Holds the authoritative set of flow documents, keyed by id.
//!
//! - `FlowStore`: the injectable store interface (list / get / upsert / remove)
//! - `MemoryFlowStore`: process-lifetime in-memory backend, no durability

pub mod error;
pub mod flow_store;
pub mod memory_store;

pub use error::{Result, StoreError};
pub use flow_store::FlowStore;
pub use memory_store::MemoryFlowStore;
