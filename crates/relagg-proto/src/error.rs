//! Protocol error types.

use thiserror::Error;

/// Errors raised while interpreting protocol values.
#[derive(Debug, Error)]
pub enum Error {
    /// A value did not have the expected kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A decimal literal could not be parsed.
    #[error("invalid decimal literal: {0}")]
    InvalidDecimal(String),
}
