//! Error types for fd-client

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Sync rejected: {0}")]
    SyncRejected(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
