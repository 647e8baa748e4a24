//! relagg protocol types.
//!
//! Leaf types shared by the planner, policy evaluation and execution
//! adapters.
//!
//! # Modules
//!
//! - [`value`] - Runtime scalar values
//! - [`expr`] - Filter expression trees with parent-row references
//! - [`aggregate`] - Aggregate kinds and results
//! - [`error`] - Protocol error types

pub mod aggregate;
pub mod error;
pub mod expr;
pub mod value;

pub use aggregate::{AggregateKind, AggregateResult};
pub use error::Error;
pub use expr::{CompareOp, Expr, Operand};
pub use value::Value;
