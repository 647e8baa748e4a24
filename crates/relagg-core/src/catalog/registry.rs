//! The immutable resource registry and relationship catalog.
//!
//! A registry is built once, validated as a whole, and then only read.
//! Planning calls share it by reference across threads.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use relagg_proto::Expr;

use super::aggregate::AggregateDef;
use super::relation::{Cardinality, JoinCondition};
use super::resource::ResourceDef;
use super::schema::SchemaDocument;
use super::types::ScalarType;
use crate::error::{Error, Result};

/// One relationship resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipResolution {
    /// Source resource name.
    pub source: String,
    /// Relationship name.
    pub relationship: String,
    /// Destination resource name.
    pub destination: String,
    /// Relationship cardinality.
    pub cardinality: Cardinality,
    /// Structural join condition.
    pub join: JoinCondition,
}

/// Static metadata about how resources relate.
pub trait RelationshipCatalog: Send + Sync {
    /// Resolve `relationship` on `resource`.
    fn resolve(&self, resource: &str, relationship: &str) -> Result<RelationshipResolution>;
}

/// Immutable registry of resource definitions addressed by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: HashMap<String, ResourceDef>,
    version: u64,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build a registry from a schema document.
    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        let mut builder = Self::builder().version(document.version);
        for resource in document.resources {
            builder = builder.resource(resource);
        }
        builder.build()
    }

    /// Build a registry from a JSON schema document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_document(SchemaDocument::from_json(json)?)
    }

    /// Build a registry from a JSON schema file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Schema version the registry was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get a resource by name.
    pub fn get_resource(&self, name: &str) -> Option<&ResourceDef> {
        self.resources.get(name)
    }

    /// Get a resource by name, failing if it is not registered.
    pub fn resource(&self, name: &str) -> Result<&ResourceDef> {
        self.get_resource(name)
            .ok_or_else(|| Error::UnknownResource(name.to_string()))
    }

    /// Registered resource names, sorted.
    pub fn resource_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resolve every hop of `path` starting at `owner`.
    pub fn walk(&self, owner: &str, path: &[String]) -> Result<Vec<RelationshipResolution>> {
        let mut hops = Vec::with_capacity(path.len());
        let mut current = owner.to_string();
        for segment in path {
            let hop = self.resolve(&current, segment)?;
            current = hop.destination.clone();
            hops.push(hop);
        }
        Ok(hops)
    }

    /// Validate an aggregate against the resource that owns it.
    ///
    /// Checks that the path resolves, that the target field suits the
    /// kind, that the leaf filter only reads leaf attributes, and that
    /// each join filter stays inside the scope of its hop.
    pub fn validate_aggregate(&self, owner: &ResourceDef, aggregate: &AggregateDef) -> Result<()> {
        let hops = self.walk(&owner.name, &aggregate.relationship_path)?;
        let leaf = match hops.last() {
            Some(hop) => self.resource(&hop.destination)?,
            None => owner,
        };

        match (&aggregate.field, aggregate.kind.requires_field()) {
            (None, true) => {
                return Err(Error::InvalidDefinition(format!(
                    "aggregate '{}' of kind {} requires a field",
                    aggregate.name,
                    aggregate.kind.name()
                )));
            }
            (Some(field), _) => {
                let attribute =
                    leaf.get_attribute(field)
                        .ok_or_else(|| Error::UnknownAttribute {
                            resource: leaf.name.clone(),
                            attribute: field.clone(),
                        })?;
                if aggregate.kind.requires_numeric() && !attribute.scalar.is_numeric() {
                    return Err(Error::InvalidDefinition(format!(
                        "aggregate '{}' of kind {} needs a numeric field, '{}' is {}",
                        aggregate.name,
                        aggregate.kind.name(),
                        field,
                        attribute.scalar.name()
                    )));
                }
            }
            (None, false) => {}
        }

        if let Some(filter) = &aggregate.filter {
            if !filter.parent_fields().is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "filter of aggregate '{}' references a parent row; use a join filter",
                    aggregate.name
                )));
            }
            if let Some(unknown) = first_unknown(filter.fields().iter(), leaf) {
                return Err(Error::InvalidDefinition(format!(
                    "filter of aggregate '{}' references '{}', not an attribute of {}",
                    aggregate.name, unknown, leaf.name
                )));
            }
        }

        for join_filter in &aggregate.join_filters {
            let path = &join_filter.path;
            let is_prefix = !path.is_empty()
                && path.len() <= hops.len()
                && aggregate.relationship_path.starts_with(path);
            if !is_prefix {
                return Err(Error::InvalidJoinFilterScope {
                    aggregate: aggregate.name.clone(),
                    detail: format!("path {} is not a prefix of the aggregate path", path.join(".")),
                });
            }

            let hop = &hops[path.len() - 1];
            let source = self.resource(&hop.source)?;
            let target = self.resource(&hop.destination)?;
            if let Some(unknown) = first_unknown(join_filter.filter.fields().iter(), target) {
                return Err(Error::InvalidJoinFilterScope {
                    aggregate: aggregate.name.clone(),
                    detail: format!("'{}' is not an attribute of {}", unknown, target.name),
                });
            }
            if let Some(unknown) = first_unknown(join_filter.filter.parent_fields().iter(), source) {
                return Err(Error::InvalidJoinFilterScope {
                    aggregate: aggregate.name.clone(),
                    detail: format!(
                        "parent reference '{}' is not an attribute of {}",
                        unknown, source.name
                    ),
                });
            }
        }

        Ok(())
    }

    /// One tenant value is compared against every multitenant resource, so
    /// all tenancy attributes must share a scalar type.
    fn validate_tenancy_types(&self) -> Result<()> {
        let mut first: Option<(&str, ScalarType)> = None;
        for name in self.resource_names() {
            let resource = self.resource(name)?;
            let Some(tenancy) = &resource.multitenancy else {
                continue;
            };
            let Some(attribute) = resource.get_attribute(&tenancy.attribute) else {
                continue;
            };
            match first {
                None => first = Some((name, attribute.scalar)),
                Some((other, scalar)) if scalar != attribute.scalar => {
                    return Err(Error::InvalidDefinition(format!(
                        "tenancy attribute {name}.{} is {:?} but {other} uses {:?}",
                        tenancy.attribute, attribute.scalar, scalar
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn validate_resource(&self, resource: &ResourceDef) -> Result<()> {
        ensure_unique(&resource.name, "attribute", resource.attributes.iter().map(|a| &a.name))?;
        ensure_unique(&resource.name, "relationship", resource.relationships.iter().map(|r| &r.name))?;
        ensure_unique(&resource.name, "aggregate", resource.aggregates.iter().map(|a| &a.name))?;
        ensure_unique(&resource.name, "action", resource.actions.iter().map(|a| &a.name))?;

        require_attribute(resource, &resource.identity_field)?;
        if let Some(tenancy) = &resource.multitenancy {
            require_attribute(resource, &tenancy.attribute)?;
        }

        for relationship in &resource.relationships {
            let destination = self.get_resource(&relationship.destination).ok_or_else(|| {
                Error::InvalidDefinition(format!(
                    "relationship {}.{} targets unknown resource '{}'",
                    resource.name, relationship.name, relationship.destination
                ))
            })?;
            require_attribute(resource, &relationship.source_attribute)?;
            require_attribute(destination, &relationship.destination_attribute)?;
        }

        let primaries = resource
            .actions
            .iter()
            .filter(|a| a.is_read() && a.primary)
            .count();
        if primaries > 1 {
            return Err(Error::InvalidDefinition(format!(
                "resource '{}' has {} primary read actions",
                resource.name, primaries
            )));
        }
        for action in &resource.actions {
            if let Some(filter) = &action.base_filter {
                check_own_filter(resource, filter, &format!("action '{}'", action.name))?;
            }
        }

        for aggregate in &resource.aggregates {
            if aggregate.relationship_path.is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "aggregate {}.{} has an empty relationship path",
                    resource.name, aggregate.name
                )));
            }
            self.validate_aggregate(resource, aggregate)?;
        }

        Ok(())
    }
}

impl RelationshipCatalog for Registry {
    fn resolve(&self, resource: &str, relationship: &str) -> Result<RelationshipResolution> {
        let source = self.resource(resource)?;
        let def = source
            .get_relationship(relationship)
            .ok_or_else(|| Error::UnknownRelationship {
                resource: resource.to_string(),
                relationship: relationship.to_string(),
            })?;
        Ok(RelationshipResolution {
            source: source.name.clone(),
            relationship: def.name.clone(),
            destination: def.destination.clone(),
            cardinality: def.cardinality,
            join: def.join(),
        })
    }
}

/// Builder collecting resource definitions before validation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    resources: Vec<ResourceDef>,
    version: u64,
}

impl RegistryBuilder {
    /// Add a resource definition.
    pub fn resource(mut self, resource: ResourceDef) -> Self {
        self.resources.push(resource);
        self
    }

    /// Set the schema version.
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Validate every definition and freeze the registry.
    pub fn build(self) -> Result<Registry> {
        let mut resources = HashMap::with_capacity(self.resources.len());
        for mut resource in self.resources {
            resource.ensure_read_action();
            let name = resource.name.clone();
            if resources.insert(name.clone(), resource).is_some() {
                return Err(Error::DuplicateDefinition(format!("resource '{name}'")));
            }
        }

        let registry = Registry {
            resources,
            version: self.version,
        };
        for name in registry.resource_names() {
            registry.validate_resource(registry.resource(name)?)?;
        }
        registry.validate_tenancy_types()?;

        tracing::debug!(
            resources = registry.len(),
            version = registry.version,
            "built resource registry"
        );
        Ok(registry)
    }
}

fn ensure_unique<'a>(
    resource: &str,
    what: &str,
    names: impl Iterator<Item = &'a String>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::DuplicateDefinition(format!(
                "{what} '{name}' on resource '{resource}'"
            )));
        }
    }
    Ok(())
}

fn require_attribute(resource: &ResourceDef, attribute: &str) -> Result<()> {
    if resource.has_attribute(attribute) {
        Ok(())
    } else {
        Err(Error::UnknownAttribute {
            resource: resource.name.clone(),
            attribute: attribute.to_string(),
        })
    }
}

fn first_unknown<'a>(
    mut names: impl Iterator<Item = &'a String>,
    resource: &ResourceDef,
) -> Option<&'a String> {
    names.find(|name| !resource.has_attribute(name))
}

fn check_own_filter(resource: &ResourceDef, filter: &Expr, owner: &str) -> Result<()> {
    if !filter.parent_fields().is_empty() {
        return Err(Error::InvalidDefinition(format!(
            "{owner} on '{}' references a parent row",
            resource.name
        )));
    }
    if let Some(unknown) = first_unknown(filter.fields().iter(), resource) {
        return Err(Error::InvalidDefinition(format!(
            "{owner} on '{}' references unknown attribute '{unknown}'",
            resource.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionDef, AttributeDef, Multitenancy, RelationDef};
    use relagg_proto::AggregateKind;

    fn user() -> ResourceDef {
        ResourceDef::new("User", "id")
            .with_attribute(AttributeDef::required("id", ScalarType::Integer))
            .with_attribute(AttributeDef::new("thing", ScalarType::String))
            .with_relationship(RelationDef::has_many("posts", "Post", "author_id"))
    }

    fn post() -> ResourceDef {
        ResourceDef::new("Post", "id")
            .with_attribute(AttributeDef::required("id", ScalarType::Integer))
            .with_attribute(AttributeDef::new("author_id", ScalarType::Integer))
            .with_attribute(AttributeDef::new("thing", ScalarType::String))
            .with_attribute(AttributeDef::new("score", ScalarType::Decimal))
            .with_attribute(AttributeDef::new("title", ScalarType::String))
            .with_relationship(RelationDef::belongs_to("author", "User", "author_id"))
    }

    fn build(user: ResourceDef) -> Result<Registry> {
        Registry::builder().resource(user).resource(post()).build()
    }

    #[test]
    fn test_registry_build_and_resolve() {
        let registry = build(user()).unwrap();
        assert_eq!(registry.resource_names(), vec!["Post", "User"]);

        let hop = registry.resolve("User", "posts").unwrap();
        assert_eq!(hop.destination, "Post");
        assert_eq!(hop.cardinality, Cardinality::HasMany);
        assert_eq!(hop.join.destination_attribute, "author_id");

        let back = registry.walk("User", &["posts".into(), "author".into()]).unwrap();
        assert_eq!(back[1].destination, "User");
    }

    #[test]
    fn test_default_read_action_added() {
        let registry = build(user()).unwrap();
        let user = registry.resource("User").unwrap();
        assert_eq!(user.read_action(None).unwrap().name, "read");
    }

    #[test]
    fn test_unknown_relationship() {
        let registry = build(user()).unwrap();
        assert!(matches!(
            registry.resolve("User", "comments"),
            Err(Error::UnknownRelationship { .. })
        ));
        assert!(matches!(
            registry.resolve("Nope", "posts"),
            Err(Error::UnknownResource(_))
        ));
    }

    #[test]
    fn test_aggregate_with_bad_path_rejected() {
        let result = build(user().with_aggregate(AggregateDef::count("c", ["posts", "comments"])));
        assert!(matches!(result, Err(Error::UnknownRelationship { .. })));
    }

    #[test]
    fn test_aggregate_field_checks() {
        let missing = build(user().with_aggregate(AggregateDef::new(
            "s",
            AggregateKind::Sum,
            ["posts"],
        )));
        assert!(matches!(missing, Err(Error::InvalidDefinition(_))));

        let not_numeric = build(user().with_aggregate(
            AggregateDef::new("s", AggregateKind::Avg, ["posts"]).with_field("title"),
        ));
        assert!(matches!(not_numeric, Err(Error::InvalidDefinition(_))));

        let unknown = build(user().with_aggregate(
            AggregateDef::new("s", AggregateKind::Max, ["posts"]).with_field("nope"),
        ));
        assert!(matches!(unknown, Err(Error::UnknownAttribute { .. })));

        let ordered = build(user().with_aggregate(
            AggregateDef::new("s", AggregateKind::Max, ["posts"]).with_field("title"),
        ));
        assert!(ordered.is_ok());
    }

    #[test]
    fn test_join_filter_scope() {
        let ok = build(user().with_aggregate(
            AggregateDef::count("c", ["posts"])
                .with_join_filter(["posts"], Expr::field_eq_parent("thing", "thing")),
        ));
        assert!(ok.is_ok());

        let bad_parent = build(user().with_aggregate(
            AggregateDef::count("c", ["posts"])
                .with_join_filter(["posts"], Expr::field_eq_parent("thing", "score")),
        ));
        assert!(matches!(bad_parent, Err(Error::InvalidJoinFilterScope { .. })));

        let not_prefix = build(user().with_aggregate(
            AggregateDef::count("c", ["posts"])
                .with_join_filter(["author"], Expr::eq("thing", "x")),
        ));
        assert!(matches!(not_prefix, Err(Error::InvalidJoinFilterScope { .. })));
    }

    #[test]
    fn test_leaf_filter_rejects_parent_reference() {
        let result = build(user().with_aggregate(
            AggregateDef::count("c", ["posts"]).with_filter(Expr::field_eq_parent("thing", "thing")),
        ));
        assert!(matches!(result, Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn test_duplicate_definitions() {
        let result = Registry::builder().resource(user()).resource(user()).resource(post()).build();
        assert!(matches!(result, Err(Error::DuplicateDefinition(_))));

        let result = build(user().with_attribute(AttributeDef::new("thing", ScalarType::Bool)));
        assert!(matches!(result, Err(Error::DuplicateDefinition(_))));
    }

    #[test]
    fn test_multitenancy_attribute_must_exist() {
        let result = build(user().with_multitenancy(Multitenancy::attribute("org")));
        assert!(matches!(result, Err(Error::UnknownAttribute { .. })));
    }

    #[test]
    fn test_tenancy_types_must_agree() {
        let tenant_user = || {
            user()
                .with_attribute(AttributeDef::new("org", ScalarType::String))
                .with_multitenancy(Multitenancy::attribute("org").global())
        };
        let post_with = |scalar| {
            post()
                .with_attribute(AttributeDef::new("org", scalar))
                .with_multitenancy(Multitenancy::attribute("org"))
        };

        let result = Registry::builder()
            .resource(tenant_user())
            .resource(post_with(ScalarType::Integer))
            .build();
        match result {
            Err(Error::InvalidDefinition(message)) => assert!(message.contains("tenancy")),
            other => panic!("expected invalid definition, got {other:?}"),
        }

        let registry = Registry::builder()
            .resource(tenant_user())
            .resource(post_with(ScalarType::String))
            .build();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_action_filter_checked() {
        let result = build(
            user().with_action(ActionDef::read("odd").with_filter(Expr::eq("missing", true))),
        );
        assert!(matches!(result, Err(Error::InvalidDefinition(_))));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"resources": [{{"name": "Tag", "attributes": [{{"name": "id", "type": "integer"}}]}}]}}"#
        )
        .unwrap();

        let registry = Registry::from_file(file.path()).unwrap();
        assert!(registry.get_resource("Tag").is_some());
    }
}
