//! Schema documents: the serialized form of a registry.

use serde::{Deserialize, Serialize};

use super::resource::ResourceDef;
use crate::error::Result;

/// A schema document listing every resource definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Schema version, informational only.
    #[serde(default)]
    pub version: u64,
    /// Resource definitions.
    pub resources: Vec<ResourceDef>,
}

impl SchemaDocument {
    /// Create an empty document.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            resources: Vec::new(),
        }
    }

    /// Add a resource definition.
    pub fn with_resource(mut self, resource: ResourceDef) -> Self {
        self.resources.push(resource);
        self
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the document to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
