//! The execution adapter seam.

use std::collections::HashMap;

use relagg_proto::{AggregateResult, Value};
use thiserror::Error;

use super::plan::QueryPlan;

/// Errors raised by an execution adapter.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Plan references a resource the adapter does not store.
    #[error("unknown resource in plan: {0}")]
    UnknownResource(String),

    /// Value of an unexpected kind.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Expected kind.
        expected: &'static str,
        /// Kind found.
        actual: &'static str,
    },

    /// Arithmetic overflow while accumulating.
    #[error("numeric overflow computing {0}")]
    Overflow(&'static str),

    /// Filter could not be evaluated.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<relagg_proto::Error> for ExecutionError {
    fn from(err: relagg_proto::Error) -> Self {
        match err {
            relagg_proto::Error::TypeMismatch { expected, actual } => {
                ExecutionError::TypeMismatch { expected, actual }
            }
            other => ExecutionError::Evaluation(other.to_string()),
        }
    }
}

/// Executes logical aggregate plans against storage.
///
/// A single call must observe one consistent snapshot across the whole
/// join chain, including every root of a batch.
pub trait ExecutionAdapter: Send + Sync {
    /// Execute a plan over every matching root row.
    fn execute(&self, plan: &QueryPlan) -> Result<AggregateResult, ExecutionError>;

    /// Execute a plan once per root identity.
    ///
    /// Identities with no matching root row may be omitted from the map.
    fn execute_batch(
        &self,
        plan: &QueryPlan,
        identities: &[Value],
    ) -> Result<HashMap<Value, AggregateResult>, ExecutionError>;
}
