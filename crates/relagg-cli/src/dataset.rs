//! Loading plain JSON datasets and actor documents.
//!
//! Rows are plain JSON objects. Values are typed against the registry:
//! integers stay integers unless the attribute is decimal, and decimal
//! attributes also accept strings so exact values survive JSON.

use std::path::Path;

use relagg_core::{Actor, MemoryStore, Registry, ResourceDef, Row, ScalarType, Value};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::CliError;

/// Convert a JSON scalar into a [`Value`], guided by the attribute type.
pub fn json_to_value(json: &JsonValue, scalar: Option<ScalarType>) -> Result<Value, CliError> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => match (n.as_i64(), scalar) {
            (Some(i), Some(ScalarType::Decimal)) => Ok(Value::Decimal(i.into())),
            (Some(i), _) => Ok(Value::Int64(i)),
            (None, _) => decimal(&n.to_string()),
        },
        JsonValue::String(s) if scalar == Some(ScalarType::Decimal) => decimal(s),
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(CliError::Dataset(format!(
            "expected a scalar, found {json}"
        ))),
    }
}

fn decimal(literal: &str) -> Result<Value, CliError> {
    Value::parse_decimal(literal).map_err(|e| CliError::Dataset(e.to_string()))
}

/// Convert a JSON object into a row of `resource`.
pub fn json_to_row(resource: &ResourceDef, json: &JsonValue) -> Result<Row, CliError> {
    let object = json.as_object().ok_or_else(|| {
        CliError::Dataset(format!("rows of {} must be objects", resource.name))
    })?;

    let mut row = Row::new();
    for (key, raw) in object {
        let attribute = resource.get_attribute(key).ok_or_else(|| {
            CliError::Dataset(format!("{} has no attribute '{key}'", resource.name))
        })?;
        let value = json_to_value(raw, Some(attribute.scalar))?;
        if !attribute.scalar.accepts(&value) {
            return Err(CliError::Dataset(format!(
                "{}.{key} expects {}, found {}",
                resource.name,
                attribute.scalar.name(),
                value.kind_name()
            )));
        }
        row.insert(key.clone(), value);
    }
    Ok(row)
}

/// Build an in-memory store from a dataset document.
///
/// The document maps resource names to arrays of row objects. Resources
/// absent from the document get empty tables.
pub fn load_store(registry: &Registry, json: &str) -> Result<MemoryStore, CliError> {
    let document: JsonValue = serde_json::from_str(json)?;
    let tables = document
        .as_object()
        .ok_or_else(|| CliError::Dataset("dataset must be an object".into()))?;

    let store = MemoryStore::for_registry(registry);
    for (name, rows) in tables {
        let resource = registry.resource(name)?;
        let rows = rows
            .as_array()
            .ok_or_else(|| CliError::Dataset(format!("rows of {name} must be an array")))?;
        for row in rows {
            store.insert(name, json_to_row(resource, row)?)?;
        }
        debug!(resource = %name, rows = rows.len(), "loaded table");
    }
    Ok(store)
}

/// Read a dataset file into a store.
pub fn load_store_file(registry: &Registry, path: impl AsRef<Path>) -> Result<MemoryStore, CliError> {
    let json = std::fs::read_to_string(path)?;
    load_store(registry, &json)
}

/// Parse an actor document.
///
/// ```json
/// {"id": 7, "attributes": {"org": "acme"}, "lists": {"teams": [1, 2]}, "roles": ["admin"]}
/// ```
pub fn load_actor(json: &str) -> Result<Actor, CliError> {
    let document: JsonValue = serde_json::from_str(json)?;
    let object = document
        .as_object()
        .ok_or_else(|| CliError::Dataset("actor must be an object".into()))?;

    let id = object
        .get("id")
        .ok_or_else(|| CliError::Dataset("actor needs an id".into()))?;
    let mut actor = Actor::new(json_to_value(id, None)?);

    if let Some(attributes) = object.get("attributes") {
        for (key, raw) in expect_object(attributes, "attributes")? {
            actor = actor.with_attribute(key.as_str(), json_to_value(raw, None)?);
        }
    }
    if let Some(lists) = object.get("lists") {
        for (key, raw) in expect_object(lists, "lists")? {
            let items = raw
                .as_array()
                .ok_or_else(|| CliError::Dataset(format!("actor list '{key}' must be an array")))?;
            let values = items
                .iter()
                .map(|item| json_to_value(item, None))
                .collect::<Result<Vec<_>, _>>()?;
            actor = actor.with_list(key.as_str(), values);
        }
    }
    if let Some(roles) = object.get("roles") {
        let roles = roles
            .as_array()
            .ok_or_else(|| CliError::Dataset("actor roles must be an array".into()))?;
        for role in roles {
            let role = role
                .as_str()
                .ok_or_else(|| CliError::Dataset("actor roles must be strings".into()))?;
            actor = actor.with_role(role);
        }
    }
    Ok(actor)
}

fn expect_object<'a>(
    json: &'a JsonValue,
    what: &str,
) -> Result<&'a serde_json::Map<String, JsonValue>, CliError> {
    json.as_object()
        .ok_or_else(|| CliError::Dataset(format!("actor {what} must be an object")))
}

/// Read an actor file.
pub fn load_actor_file(path: impl AsRef<Path>) -> Result<Actor, CliError> {
    let json = std::fs::read_to_string(path)?;
    load_actor(&json)
}

/// Type a raw tenant string against the resource's tenant attribute.
pub fn tenant_value(resource: &ResourceDef, raw: &str) -> Value {
    let scalar = resource
        .multitenancy
        .as_ref()
        .and_then(|m| resource.get_attribute(&m.attribute))
        .map(|attribute| attribute.scalar);
    match scalar {
        Some(ScalarType::Integer) => raw
            .parse::<i64>()
            .map(Value::Int64)
            .unwrap_or_else(|_| Value::from(raw)),
        _ => Value::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relagg_core::{AttributeDef, Expr, Multitenancy};
    use rust_decimal::Decimal;

    fn registry() -> Registry {
        let order = ResourceDef::new("Order", "id")
            .with_attributes([
                AttributeDef::required("id", ScalarType::Integer),
                AttributeDef::new("shop", ScalarType::Integer),
                AttributeDef::new("total", ScalarType::Decimal),
                AttributeDef::new("note", ScalarType::String),
            ])
            .with_multitenancy(Multitenancy::attribute("shop"));
        Registry::builder().resource(order).build().unwrap()
    }

    #[test]
    fn test_json_to_value() {
        assert_eq!(json_to_value(&serde_json::json!(3), None).unwrap(), Value::Int64(3));
        assert_eq!(
            json_to_value(&serde_json::json!(3), Some(ScalarType::Decimal)).unwrap(),
            Value::Decimal(Decimal::from(3))
        );
        assert_eq!(
            json_to_value(&serde_json::json!("10.10"), Some(ScalarType::Decimal)).unwrap(),
            Value::Decimal(Decimal::new(1010, 2))
        );
        assert_eq!(
            json_to_value(&serde_json::json!(2.5), None).unwrap(),
            Value::Decimal(Decimal::new(25, 1))
        );
        assert_eq!(json_to_value(&serde_json::json!(null), None).unwrap(), Value::Null);
        assert!(json_to_value(&serde_json::json!([1]), None).is_err());
    }

    #[test]
    fn test_load_store() {
        let registry = registry();
        let json = r#"{"Order": [
            {"id": 1, "shop": 1, "total": "10.10"},
            {"id": 2, "shop": 2, "total": 5, "note": "gift"}
        ]}"#;
        let store = load_store(&registry, json).unwrap();

        assert_eq!(store.len("Order").unwrap(), 2);
        let gifts = store.select("Order", &Expr::eq("note", "gift")).unwrap();
        assert_eq!(gifts[0].get("total"), Some(&Value::Decimal(Decimal::from(5))));
    }

    #[test]
    fn test_load_store_rejects_bad_rows() {
        let registry = registry();
        assert!(matches!(
            load_store(&registry, r#"{"Order": [{"id": "one"}]}"#),
            Err(CliError::Dataset(_))
        ));
        assert!(matches!(
            load_store(&registry, r#"{"Order": [{"colour": "red"}]}"#),
            Err(CliError::Dataset(_))
        ));
        assert!(matches!(
            load_store(&registry, r#"{"Invoice": []}"#),
            Err(CliError::Engine(_))
        ));
    }

    #[test]
    fn test_load_actor() {
        let actor = load_actor(
            r#"{"id": 7, "attributes": {"org": "acme"}, "lists": {"teams": [1, 2]}, "roles": ["admin"]}"#,
        )
        .unwrap();

        assert_eq!(actor.id, Value::Int64(7));
        assert_eq!(actor.get_attribute("org"), Some(&Value::from("acme")));
        assert_eq!(actor.get_values("teams"), Some(vec![Value::Int64(1), Value::Int64(2)]));
        assert!(actor.has_role("admin"));
        assert!(load_actor(r#"{"attributes": {}}"#).is_err());
    }

    #[test]
    fn test_tenant_value_follows_attribute_type() {
        let registry = registry();
        let order = registry.resource("Order").unwrap();
        assert_eq!(tenant_value(order, "2"), Value::Int64(2));
        assert_eq!(tenant_value(order, "north"), Value::from("north"));
    }

    #[test]
    fn test_load_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"Order": [{"id": 1, "shop": 1}]}"#).unwrap();

        let store = load_store_file(&registry(), &path).unwrap();
        assert_eq!(store.len("Order").unwrap(), 1);
    }
}
