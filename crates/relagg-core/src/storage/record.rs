//! Rows and loaded records.

use std::collections::BTreeMap;

use relagg_proto::Value;

/// A stored row: attribute name to value. Missing attributes read as null.
pub type Row = BTreeMap<String, Value>;

/// A fetched root record with named aggregate slots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Attribute values.
    pub fields: Row,
    /// Aggregate results written by the loader.
    pub aggregates: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record from a row.
    pub fn new(fields: Row) -> Self {
        Self {
            fields,
            aggregates: BTreeMap::new(),
        }
    }

    /// Build a record from `(attribute, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Get an attribute value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Identity value, if present and non-null.
    pub fn identity(&self, identity_field: &str) -> Option<&Value> {
        self.get(identity_field).filter(|v| !v.is_null())
    }

    /// Get a loaded aggregate value.
    pub fn aggregate(&self, name: &str) -> Option<&Value> {
        self.aggregates.get(name)
    }

    /// Write an aggregate slot.
    pub fn set_aggregate(&mut self, name: impl Into<String>, value: Value) {
        self.aggregates.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_slots() {
        let mut record = Record::from_pairs([("id", Value::from(1)), ("title", Value::from("hi"))]);
        assert_eq!(record.identity("id"), Some(&Value::Int64(1)));
        assert_eq!(record.aggregate("count_of_comments"), None);

        record.set_aggregate("count_of_comments", Value::Int64(4));
        assert_eq!(record.aggregate("count_of_comments"), Some(&Value::Int64(4)));
        assert_eq!(record.get("title"), Some(&Value::from("hi")));
    }

    #[test]
    fn test_null_identity() {
        let record = Record::from_pairs([("id", Value::Null)]);
        assert_eq!(record.identity("id"), None);
        assert_eq!(record.identity("missing"), None);
    }
}
