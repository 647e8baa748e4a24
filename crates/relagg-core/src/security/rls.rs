//! Row-level policy definitions and compilation.
//!
//! Policies are attached to resources and compiled, per actor and
//! action, into a filter over the resource's own attributes.

use relagg_proto::{Expr, Value};
use serde::{Deserialize, Serialize};

use super::context::Actor;
use super::error::{SecurityError, SecurityResult};
use super::policy::PolicyDecision;
use crate::catalog::{ActionDef, ActionType, ResourceDef};

/// Type of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    /// Row is visible if ANY permissive policy matches.
    #[default]
    Permissive,
    /// Row is visible only if ALL restrictive policies match.
    Restrictive,
}

/// Policy filter that may reference actor attributes.
///
/// Note: uses serde because the structure is recursive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolicyExpr {
    /// A plain filter over the resource's attributes.
    Standard(Expr),
    /// Field equals an actor attribute.
    /// Example: `org_id = actor.org_id`
    ActorEq {
        /// Field name on the resource.
        field: String,
        /// Actor attribute name.
        attribute: String,
    },
    /// Field is one of the values of an actor list attribute.
    ActorIn {
        /// Field name on the resource.
        field: String,
        /// Actor attribute name.
        attribute: String,
    },
    /// An actor is present.
    ActorPresent,
    /// All conditions must be true.
    And(Vec<PolicyExpr>),
    /// At least one condition must be true.
    Or(Vec<PolicyExpr>),
    /// Always true.
    True,
    /// Always false.
    False,
}

impl PolicyExpr {
    /// Create an actor equality filter.
    pub fn actor_eq(field: impl Into<String>, attribute: impl Into<String>) -> Self {
        PolicyExpr::ActorEq {
            field: field.into(),
            attribute: attribute.into(),
        }
    }

    /// Create an actor IN filter.
    pub fn actor_in(field: impl Into<String>, attribute: impl Into<String>) -> Self {
        PolicyExpr::ActorIn {
            field: field.into(),
            attribute: attribute.into(),
        }
    }

    /// Resolve actor references into a plain expression.
    ///
    /// Without an actor, actor-referencing terms are false.
    pub fn resolve(
        &self,
        actor: Option<&Actor>,
        resource: &ResourceDef,
        policy: &str,
    ) -> SecurityResult<Expr> {
        match self {
            PolicyExpr::Standard(expr) => {
                // Policies see only the row they guard.
                if let Some(field) = expr.parent_fields().into_iter().next() {
                    return Err(SecurityError::ParentReference {
                        policy: policy.to_string(),
                        resource: resource.name.clone(),
                        field,
                    });
                }
                for field in expr.fields() {
                    check_field(resource, &field, policy)?;
                }
                Ok(expr.clone())
            }
            PolicyExpr::ActorEq { field, attribute } => {
                check_field(resource, field, policy)?;
                let Some(actor) = actor else {
                    return Ok(Expr::False);
                };
                let value = actor
                    .get_attribute(attribute)
                    .ok_or_else(|| missing(policy, attribute))?;
                // A null attribute can never match under three-valued comparison.
                if value.is_null() {
                    return Ok(Expr::False);
                }
                Ok(Expr::eq(field.clone(), value.clone()))
            }
            PolicyExpr::ActorIn { field, attribute } => {
                check_field(resource, field, policy)?;
                let Some(actor) = actor else {
                    return Ok(Expr::False);
                };
                let values: Vec<Value> = actor
                    .get_values(attribute)
                    .ok_or_else(|| missing(policy, attribute))?
                    .into_iter()
                    .filter(|v| !v.is_null())
                    .collect();
                if values.is_empty() {
                    return Ok(Expr::False);
                }
                Ok(Expr::in_values(field.clone(), values))
            }
            PolicyExpr::ActorPresent => Ok(if actor.is_some() { Expr::True } else { Expr::False }),
            PolicyExpr::And(exprs) => Ok(Expr::and_all(
                exprs
                    .iter()
                    .map(|e| e.resolve(actor, resource, policy))
                    .collect::<SecurityResult<Vec<_>>>()?,
            )),
            PolicyExpr::Or(exprs) => Ok(Expr::or_any(
                exprs
                    .iter()
                    .map(|e| e.resolve(actor, resource, policy))
                    .collect::<SecurityResult<Vec<_>>>()?,
            )),
            PolicyExpr::True => Ok(Expr::True),
            PolicyExpr::False => Ok(Expr::False),
        }
    }
}

impl From<Expr> for PolicyExpr {
    fn from(expr: Expr) -> Self {
        PolicyExpr::Standard(expr)
    }
}

fn check_field(resource: &ResourceDef, field: &str, policy: &str) -> SecurityResult<()> {
    if resource.has_attribute(field) {
        Ok(())
    } else {
        Err(SecurityError::UnknownField {
            policy: policy.to_string(),
            resource: resource.name.clone(),
            field: field.to_string(),
        })
    }
}

fn missing(policy: &str, attribute: &str) -> SecurityError {
    SecurityError::MissingActorAttribute {
        policy: policy.to_string(),
        attribute: attribute.to_string(),
    }
}

/// Row-level policy attached to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RlsPolicy {
    /// Policy name.
    pub name: String,
    /// Policy type (permissive or restrictive).
    #[serde(default)]
    pub policy_type: PolicyType,
    /// Action types this policy applies to; empty means all.
    #[serde(default)]
    pub action_types: Vec<ActionType>,
    /// Action names this policy applies to; empty means all.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Filter expression.
    pub filter: PolicyExpr,
    /// Role that bypasses this policy.
    #[serde(default)]
    pub bypass_role: Option<String>,
}

impl RlsPolicy {
    /// Create a permissive policy applying to every action.
    pub fn new(name: impl Into<String>, filter: impl Into<PolicyExpr>) -> Self {
        Self {
            name: name.into(),
            policy_type: PolicyType::Permissive,
            action_types: Vec::new(),
            actions: Vec::new(),
            filter: filter.into(),
            bypass_role: None,
        }
    }

    /// Permissive read policy: rows matching `filter` are visible.
    pub fn allow_read_if(name: impl Into<String>, filter: impl Into<PolicyExpr>) -> Self {
        Self::new(name, filter).with_action_types(vec![ActionType::Read])
    }

    /// Set the policy type.
    pub fn with_type(mut self, policy_type: PolicyType) -> Self {
        self.policy_type = policy_type;
        self
    }

    /// Restrict to the given action types.
    pub fn with_action_types(mut self, action_types: Vec<ActionType>) -> Self {
        self.action_types = action_types;
        self
    }

    /// Restrict to the given action names.
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Set a bypass role.
    pub fn with_bypass(mut self, role: impl Into<String>) -> Self {
        self.bypass_role = Some(role.into());
        self
    }

    /// Check if this policy applies to the given action.
    pub fn applies_to(&self, action: &ActionDef) -> bool {
        (self.action_types.is_empty() || self.action_types.contains(&action.action_type))
            && (self.actions.is_empty() || self.actions.iter().any(|a| a == &action.name))
    }

    /// Check if the actor can bypass this policy.
    pub fn can_bypass(&self, actor: Option<&Actor>) -> bool {
        match (&self.bypass_role, actor) {
            (Some(role), Some(actor)) => actor.has_role(role),
            _ => false,
        }
    }
}

/// Compiles a resource's policies into a decision.
pub struct RlsPolicyCompiler;

impl RlsPolicyCompiler {
    /// Compile `resource`'s policies for `actor` performing `action`.
    ///
    /// Permissive policies are OR'd, restrictive policies AND'd, and the
    /// two groups AND'd. A resource without policies allows everything;
    /// one whose policies do not cover the action denies everything.
    pub fn compile(
        actor: Option<&Actor>,
        action: &ActionDef,
        resource: &ResourceDef,
    ) -> SecurityResult<PolicyDecision> {
        if resource.policies.is_empty() {
            return Ok(PolicyDecision::AllowAll);
        }

        let applicable: Vec<&RlsPolicy> = resource
            .policies
            .iter()
            .filter(|p| p.applies_to(action))
            .collect();
        if applicable.is_empty() {
            return Ok(PolicyDecision::DenyAll);
        }

        let (permissive, restrictive): (Vec<&RlsPolicy>, Vec<&RlsPolicy>) = applicable
            .into_iter()
            .partition(|p| p.policy_type == PolicyType::Permissive);

        let permissive_filter = Self::compile_permissive(&permissive, actor, resource)?;
        let restrictive_filter = Self::compile_restrictive(&restrictive, actor, resource)?;

        Ok(PolicyDecision::from_expr(
            permissive_filter.conjoin(restrictive_filter),
        ))
    }

    /// Compile permissive policies (OR'd together).
    fn compile_permissive(
        policies: &[&RlsPolicy],
        actor: Option<&Actor>,
        resource: &ResourceDef,
    ) -> SecurityResult<Expr> {
        if policies.is_empty() || policies.iter().any(|p| p.can_bypass(actor)) {
            return Ok(Expr::True);
        }
        let filters = policies
            .iter()
            .map(|p| p.filter.resolve(actor, resource, &p.name))
            .collect::<SecurityResult<Vec<_>>>()?;
        Ok(Expr::or_any(filters))
    }

    /// Compile restrictive policies (AND'd together).
    fn compile_restrictive(
        policies: &[&RlsPolicy],
        actor: Option<&Actor>,
        resource: &ResourceDef,
    ) -> SecurityResult<Expr> {
        let filters = policies
            .iter()
            .filter(|p| !p.can_bypass(actor))
            .map(|p| p.filter.resolve(actor, resource, &p.name))
            .collect::<SecurityResult<Vec<_>>>()?;
        Ok(Expr::and_all(filters))
    }
}
