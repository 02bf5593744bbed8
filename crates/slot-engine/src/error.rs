//! Error types for slot-engine operations.
//!
//! Only conditions that point at an upstream data-integrity bug live here.
//! Policy violations and conflicts are ordinary outcomes and are returned as
//! values (see [`crate::rejection`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The schedule source failed to deliver a snapshot.
    #[error("Schedule source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
