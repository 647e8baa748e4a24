//! Policy evaluation error types.

use thiserror::Error;

/// Errors raised while evaluating authorization policies.
///
/// These are malformed-policy conditions, never authorization denials.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Policy references an actor attribute the actor does not carry.
    #[error("policy '{policy}' references missing actor attribute '{attribute}'")]
    MissingActorAttribute {
        /// Policy name.
        policy: String,
        /// Actor attribute name.
        attribute: String,
    },

    /// Policy references an attribute the resource does not define.
    #[error("policy '{policy}' references unknown field {resource}.{field}")]
    UnknownField {
        /// Policy name.
        policy: String,
        /// Resource the policy is attached to.
        resource: String,
        /// Field name.
        field: String,
    },

    /// Policy predicate reads the parent row of a hop.
    #[error("policy '{policy}' on {resource} references parent field '{field}'")]
    ParentReference {
        /// Policy name.
        policy: String,
        /// Resource the policy is attached to.
        resource: String,
        /// Parent field name.
        field: String,
    },

    /// Policy could not be compiled into a filter.
    #[error("policy compilation error: {0}")]
    PolicyCompilationError(String),
}

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;
