//! Error types.
//!
//! Engine operations degrade to no-ops instead of failing; only configuration
//! parsing and platform binding setup can report errors.

use thiserror::Error;

/// Errors surfaced by configuration parsing and platform bindings.
#[derive(Debug, Error)]
pub enum DragError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("No window object")]
    NoWindow,
    #[error("No document object")]
    NoDocument,
    #[error("DOM error: {0}")]
    Dom(String),
}

/// Result type for fallible ghostdrag operations.
pub type DragResult<T> = Result<T, DragError>;
