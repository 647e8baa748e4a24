//! Core error types.

use thiserror::Error;

use crate::query::ExecutionError;
use crate::security::SecurityError;

/// Errors raised while defining, planning or executing aggregates.
///
/// Authorization denial is not an error: a denied hop plans to an empty
/// result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Resource is not registered.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// Relationship path segment does not exist on the resource reached so far.
    #[error("unknown relationship '{relationship}' on resource '{resource}'")]
    UnknownRelationship {
        resource: String,
        relationship: String,
    },

    /// Aggregate is not defined on the resource.
    #[error("unknown aggregate '{aggregate}' on resource '{resource}'")]
    UnknownAggregate { resource: String, aggregate: String },

    /// Attribute is not defined on the resource (or hidden from the caller).
    #[error("unknown attribute '{attribute}' on resource '{resource}'")]
    UnknownAttribute { resource: String, attribute: String },

    /// Action is not defined on the resource, or is not a read action.
    #[error("unknown read action '{action}' on resource '{resource}'")]
    UnknownAction { resource: String, action: String },

    /// Multitenant resource queried without a tenant.
    #[error("resource '{resource}' requires a tenant")]
    MissingTenant { resource: String },

    /// Join filter references an attribute outside its parent scope.
    #[error("invalid join filter scope in aggregate '{aggregate}': {detail}")]
    InvalidJoinFilterScope { aggregate: String, detail: String },

    /// Malformed resource, relationship or aggregate definition.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// Name defined twice in the same scope.
    #[error("duplicate definition: {0}")]
    DuplicateDefinition(String),

    /// Relationship path exceeds the configured depth.
    #[error("relationship path depth {depth} exceeds maximum {max}")]
    PathTooDeep { depth: usize, max: usize },

    /// Loaded record carries no identity value.
    #[error("record of resource '{resource}' has no identity value")]
    MissingIdentity { resource: String },

    /// Policy evaluator failed.
    #[error("policy evaluation failure: {0}")]
    PolicyEvaluationFailure(#[from] SecurityError),

    /// Execution adapter failed.
    #[error("execution failure: {0}")]
    ExecutionFailure(#[from] ExecutionError),

    /// Schema document could not be parsed.
    #[error("schema error: {0}")]
    Schema(#[from] serde_json::Error),

    /// Schema document could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
