//! CLI error type.

use thiserror::Error;

/// Errors surfaced by the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    /// Catalog, planning or execution error from the engine.
    #[error(transparent)]
    Engine(#[from] relagg_core::Error),

    /// Error from the in-memory store.
    #[error("storage error: {0}")]
    Storage(#[from] relagg_core::ExecutionError),

    /// Malformed JSON input.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset or actor document has the wrong shape.
    #[error("invalid dataset: {0}")]
    Dataset(String),
}
