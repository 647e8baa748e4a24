//! Resource catalog: attributes, relationships, actions and aggregates.
//!
//! Definitions are collected by a [`RegistryBuilder`], validated as a
//! whole and frozen into a [`Registry`] that is never mutated afterwards.

mod action;
mod aggregate;
mod field;
mod registry;
mod relation;
mod resource;
mod schema;
mod types;

pub use action::{ActionDef, ActionType};
pub use aggregate::{AggregateDef, JoinFilter};
pub use field::{AttributeDef, Visibility};
pub use registry::{Registry, RegistryBuilder, RelationshipCatalog, RelationshipResolution};
pub use relation::{Cardinality, JoinCondition, RelationDef};
pub use resource::{Multitenancy, ResourceDef};
pub use schema::SchemaDocument;
pub use types::ScalarType;
