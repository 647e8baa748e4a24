//! The policy evaluator seam.

use relagg_proto::Expr;

use super::context::Actor;
use super::error::SecurityResult;
use super::rls::RlsPolicyCompiler;
use crate::catalog::{ActionDef, ResourceDef};

/// Outcome of evaluating policies for one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDecision {
    /// Every row is visible.
    AllowAll,
    /// No row is visible.
    DenyAll,
    /// Rows matching the filter are visible.
    Filter(Expr),
}

impl PolicyDecision {
    /// Build a decision from a compiled filter, folding constants.
    pub fn from_expr(expr: Expr) -> Self {
        match expr {
            Expr::True => PolicyDecision::AllowAll,
            Expr::False => PolicyDecision::DenyAll,
            other => PolicyDecision::Filter(other),
        }
    }

    /// The decision as a filter expression.
    pub fn to_expr(&self) -> Expr {
        match self {
            PolicyDecision::AllowAll => Expr::True,
            PolicyDecision::DenyAll => Expr::False,
            PolicyDecision::Filter(expr) => expr.clone(),
        }
    }

    /// Check if this decision denies every row.
    pub fn is_deny_all(&self) -> bool {
        matches!(self, PolicyDecision::DenyAll)
    }
}

/// Turns (actor, action, resource) into an authorization predicate.
///
/// Implementations must be pure: the planner may call them from any
/// thread and any number of times per request.
pub trait PolicyEvaluator: Send + Sync {
    /// Evaluate the policies governing `action` on `resource`.
    fn evaluate(
        &self,
        actor: Option<&Actor>,
        action: &ActionDef,
        resource: &ResourceDef,
    ) -> SecurityResult<PolicyDecision>;
}

/// Evaluator backed by the row-level policies attached to each resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct RlsPolicyEvaluator;

impl PolicyEvaluator for RlsPolicyEvaluator {
    fn evaluate(
        &self,
        actor: Option<&Actor>,
        action: &ActionDef,
        resource: &ResourceDef,
    ) -> SecurityResult<PolicyDecision> {
        RlsPolicyCompiler::compile(actor, action, resource)
    }
}
