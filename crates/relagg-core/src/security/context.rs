//! Actor identity and the per-call aggregate context.

use std::collections::{HashMap, HashSet};

use relagg_proto::Value;
use serde::{Deserialize, Serialize};

/// The identity on whose behalf an aggregate is computed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Actor {
    /// Actor identifier.
    pub id: Value,
    /// Scalar attributes referenced by policies (e.g. `org_id`).
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    /// List-valued attributes referenced by `ActorIn` policies.
    #[serde(default)]
    pub lists: HashMap<String, Vec<Value>>,
    /// Roles; a role may bypass policies that name it.
    #[serde(default)]
    pub roles: HashSet<String>,
}

impl Actor {
    /// Create an actor with the given id.
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a scalar attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a list attribute.
    pub fn with_list(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.lists.insert(key.into(), values);
        self
    }

    /// Grant a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Look up a scalar attribute. `id` resolves to the actor id unless
    /// overridden by an explicit attribute.
    pub fn get_attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .get(key)
            .or_else(|| (key == "id").then_some(&self.id))
    }

    /// Look up an attribute as a list; scalar attributes become one-element lists.
    pub fn get_values(&self, key: &str) -> Option<Vec<Value>> {
        self.lists
            .get(key)
            .cloned()
            .or_else(|| self.get_attribute(key).map(|v| vec![v.clone()]))
    }

    /// Check if the actor holds a role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Per-call context for an aggregate request.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateContext {
    /// Acting identity, if any.
    pub actor: Option<Actor>,
    /// Whether to enforce policies at all.
    pub authorize: bool,
    /// Tenant value.
    pub tenant: Option<Value>,
    /// Read action on the root resource; the primary read action when unset.
    pub action: Option<String>,
    /// Restrict to public aggregates and attributes.
    pub public_only: bool,
}

impl Default for AggregateContext {
    fn default() -> Self {
        Self {
            actor: None,
            authorize: true,
            tenant: None,
            action: None,
            public_only: false,
        }
    }
}

impl AggregateContext {
    /// Create a context with no actor and authorization enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the actor.
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Set the tenant.
    pub fn with_tenant(mut self, tenant: impl Into<Value>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Set the root read action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set whether policies are enforced.
    pub fn with_authorize(mut self, authorize: bool) -> Self {
        self.authorize = authorize;
        self
    }

    /// Restrict to public aggregates and attributes.
    pub fn public_only(mut self) -> Self {
        self.public_only = true;
        self
    }

    /// The actor, if any.
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }
}
