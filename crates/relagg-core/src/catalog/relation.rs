//! Relationship definitions between resources.

use serde::{Deserialize, Serialize};

/// Cardinality of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Single destination; foreign key on the source.
    BelongsTo,
    /// Many destinations; foreign key on the destination.
    HasMany,
}

impl Cardinality {
    /// Whether traversing this relationship can multiply rows.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Cardinality::HasMany)
    }
}

/// Structural join condition: `source.source_attribute == destination.destination_attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinCondition {
    /// Attribute on the source (parent) row.
    pub source_attribute: String,
    /// Attribute on the destination row.
    pub destination_attribute: String,
}

/// A relationship defined on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relationship name (unique within the owning resource).
    pub name: String,
    /// Relationship cardinality.
    pub cardinality: Cardinality,
    /// Destination resource name.
    pub destination: String,
    /// Attribute on the owning resource.
    pub source_attribute: String,
    /// Attribute on the destination resource.
    pub destination_attribute: String,
}

impl RelationDef {
    /// Create a belongs-to relationship keyed by `source_attribute` on self
    /// and the destination's `id`.
    pub fn belongs_to(
        name: impl Into<String>,
        destination: impl Into<String>,
        source_attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::BelongsTo,
            destination: destination.into(),
            source_attribute: source_attribute.into(),
            destination_attribute: "id".to_string(),
        }
    }

    /// Create a has-many relationship keyed by self's `id` and
    /// `destination_attribute` on the destination.
    pub fn has_many(
        name: impl Into<String>,
        destination: impl Into<String>,
        destination_attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::HasMany,
            destination: destination.into(),
            source_attribute: "id".to_string(),
            destination_attribute: destination_attribute.into(),
        }
    }

    /// Override the source attribute.
    pub fn with_source_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.source_attribute = attribute.into();
        self
    }

    /// Override the destination attribute.
    pub fn with_destination_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.destination_attribute = attribute.into();
        self
    }

    /// The structural join condition.
    pub fn join(&self) -> JoinCondition {
        JoinCondition {
            source_attribute: self.source_attribute.clone(),
            destination_attribute: self.destination_attribute.clone(),
        }
    }
}
