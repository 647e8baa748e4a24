//! Authorization for aggregate planning.
//!
//! Policies are compiled per actor and action into a [`PolicyDecision`]
//! the planner conjoins into each scope it reads. A denial is a decision,
//! never an error; [`SecurityError`] is reserved for malformed policies.

pub mod context;
pub mod error;
pub mod policy;
pub mod rls;

pub use context::{Actor, AggregateContext};
pub use error::{SecurityError, SecurityResult};
pub use policy::{PolicyDecision, PolicyEvaluator, RlsPolicyEvaluator};
pub use rls::{PolicyExpr, PolicyType, RlsPolicy, RlsPolicyCompiler};
