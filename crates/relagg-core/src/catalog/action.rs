//! Action definitions.

use relagg_proto::Expr;
use serde::{Deserialize, Serialize};

/// Kind of action a resource exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Read records.
    Read,
    /// Create records.
    Create,
    /// Update records.
    Update,
    /// Destroy records.
    Destroy,
}

/// An action defined on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Action name (unique within the resource).
    pub name: String,
    /// Action type.
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Whether this is the primary action of its type.
    #[serde(default)]
    pub primary: bool,
    /// Filter applied to every read through this action.
    #[serde(default)]
    pub base_filter: Option<Expr>,
}

impl ActionDef {
    /// Create an action of the given type.
    pub fn new(name: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            name: name.into(),
            action_type,
            primary: false,
            base_filter: None,
        }
    }

    /// Create a read action.
    pub fn read(name: impl Into<String>) -> Self {
        Self::new(name, ActionType::Read)
    }

    /// Mark as the primary action of its type.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Set the base filter.
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.base_filter = Some(filter);
        self
    }

    /// Check if this is a read action.
    pub fn is_read(&self) -> bool {
        self.action_type == ActionType::Read
    }

    /// The base filter, or `True` when none is set.
    pub fn filter(&self) -> Expr {
        self.base_filter.clone().unwrap_or(Expr::True)
    }
}
