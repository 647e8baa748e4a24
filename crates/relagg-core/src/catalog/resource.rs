//! Resource definitions.

use serde::{Deserialize, Serialize};

use super::action::{ActionDef, ActionType};
use super::aggregate::AggregateDef;
use super::field::AttributeDef;
use super::relation::RelationDef;
use crate::error::{Error, Result};
use crate::security::RlsPolicy;

/// Attribute-based multitenancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multitenancy {
    /// Attribute holding the tenant value.
    pub attribute: String,
    /// Whether queries without a tenant may see every tenant.
    #[serde(default)]
    pub global: bool,
}

impl Multitenancy {
    /// Tenancy on `attribute` requiring a tenant for every query.
    pub fn attribute(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            global: false,
        }
    }

    /// Allow tenant-less queries across all tenants.
    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }
}

/// A resource definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Resource name (unique within the registry).
    pub name: String,
    /// Name of the identity attribute.
    #[serde(default = "default_identity")]
    pub identity_field: String,
    /// Attribute definitions.
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    /// Outgoing relationships.
    #[serde(default)]
    pub relationships: Vec<RelationDef>,
    /// Aggregate definitions.
    #[serde(default)]
    pub aggregates: Vec<AggregateDef>,
    /// Actions.
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    /// Multitenancy strategy.
    #[serde(default)]
    pub multitenancy: Option<Multitenancy>,
    /// Row-level policies.
    #[serde(default)]
    pub policies: Vec<RlsPolicy>,
}

fn default_identity() -> String {
    "id".to_string()
}

impl ResourceDef {
    /// Create a new resource definition.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
            aggregates: Vec::new(),
            actions: Vec::new(),
            multitenancy: None,
            policies: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add multiple attributes.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = AttributeDef>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: RelationDef) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Add an aggregate.
    pub fn with_aggregate(mut self, aggregate: AggregateDef) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    /// Add an action.
    pub fn with_action(mut self, action: ActionDef) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the multitenancy strategy.
    pub fn with_multitenancy(mut self, multitenancy: Multitenancy) -> Self {
        self.multitenancy = Some(multitenancy);
        self
    }

    /// Add a row-level policy.
    pub fn with_policy(mut self, policy: RlsPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check if an attribute exists.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Get a relationship by name.
    pub fn get_relationship(&self, name: &str) -> Option<&RelationDef> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Get an aggregate by name.
    pub fn get_aggregate(&self, name: &str) -> Option<&AggregateDef> {
        self.aggregates.iter().find(|a| a.name == name)
    }

    /// Get an action by name.
    pub fn get_action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// The primary read action.
    pub fn primary_read_action(&self) -> Option<&ActionDef> {
        self.actions
            .iter()
            .find(|a| a.is_read() && a.primary)
            .or_else(|| self.actions.iter().find(|a| a.is_read()))
    }

    /// Select a read action by name, or the primary read action.
    pub fn read_action(&self, name: Option<&str>) -> Result<&ActionDef> {
        let action = match name {
            Some(name) => self.get_action(name).filter(|a| a.is_read()),
            None => self.primary_read_action(),
        };
        action.ok_or_else(|| Error::UnknownAction {
            resource: self.name.clone(),
            action: name.unwrap_or("<primary read>").to_string(),
        })
    }

    /// Check if this resource is multitenant.
    pub fn is_multitenant(&self) -> bool {
        self.multitenancy.is_some()
    }

    /// Add a primary `read` action when no read action is defined.
    pub(crate) fn ensure_read_action(&mut self) {
        if !self.actions.iter().any(|a| a.action_type == ActionType::Read) {
            self.actions.push(ActionDef::read("read").primary());
        }
    }
}
