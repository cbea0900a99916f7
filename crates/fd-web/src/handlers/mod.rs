//! HTTP Request Handlers

pub mod flows;
pub mod health;
