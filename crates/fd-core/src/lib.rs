//! Core types and utilities for flowdeck
//!
//! # Modules
//!
//! - `config`: Environment file loading and server settings
//! - `error`: Error types and Result alias
//! - `flow`: Flow documents as stored and as submitted by clients

pub mod config;
pub mod error;
pub mod flow;

// Re-exports
pub use config::ServerSettings;
pub use error::{Error, Result};
pub use flow::{FlowCandidate, FlowRecord, DEFAULT_FLOW_NAME};
