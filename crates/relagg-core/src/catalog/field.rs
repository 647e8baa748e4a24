//! Attribute definitions for resources.

use serde::{Deserialize, Serialize};

use super::types::ScalarType;

/// Attribute visibility, independent of authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Exposed to public interfaces.
    #[default]
    Public,
    /// Internal only.
    Private,
}

/// An attribute definition within a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name.
    pub name: String,
    /// Scalar type.
    #[serde(rename = "type")]
    pub scalar: ScalarType,
    /// Whether the attribute may hold null.
    #[serde(default = "default_allow_nil")]
    pub allow_nil: bool,
    /// Visibility to public interfaces.
    #[serde(default)]
    pub visibility: Visibility,
}

fn default_allow_nil() -> bool {
    true
}

impl AttributeDef {
    /// Create a nullable public attribute.
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            scalar,
            allow_nil: true,
            visibility: Visibility::Public,
        }
    }

    /// Create a non-nullable public attribute.
    pub fn required(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            allow_nil: false,
            ..Self::new(name, scalar)
        }
    }

    /// Mark the attribute private.
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Check if the attribute is visible to public interfaces.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_builder() {
        let attr = AttributeDef::required("id", ScalarType::Integer);
        assert_eq!(attr.name, "id");
        assert!(!attr.allow_nil);
        assert!(attr.is_public());

        let secret = AttributeDef::new("secret", ScalarType::String).private();
        assert!(secret.allow_nil);
        assert!(!secret.is_public());
    }

    #[test]
    fn test_attribute_json_defaults() {
        let attr: AttributeDef =
            serde_json::from_str(r#"{"name": "score", "type": "decimal"}"#).unwrap();
        assert_eq!(attr.scalar, ScalarType::Decimal);
        assert!(attr.allow_nil);
        assert_eq!(attr.visibility, Visibility::Public);
    }
}
