//! Runtime value types for attributes, literals and aggregate results.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A runtime scalar value.
///
/// Maps onto the scalar types an attribute may carry (string, boolean,
/// integer, exact decimal). `Value` is `Eq + Hash` so record identities can
/// key result maps directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// Exact decimal.
    Decimal(Decimal),
    /// UTF-8 string.
    String(String),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is numeric (integer or decimal).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int64(_) | Value::Decimal(_))
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get a numeric value as an exact decimal.
    ///
    /// Integers widen losslessly; non-numeric values yield `None`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int64(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Get a numeric value as an exact decimal, failing on other kinds.
    pub fn try_decimal(&self) -> Result<Decimal, Error> {
        self.as_decimal().ok_or(Error::TypeMismatch {
            expected: "numeric",
            actual: self.kind_name(),
        })
    }

    /// Parse a decimal literal such as `"10.25"`.
    pub fn parse_decimal(literal: &str) -> Result<Value, Error> {
        literal
            .trim()
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|_| Error::InvalidDecimal(literal.to_string()))
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int64(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
        }
    }

    /// Compare two values by their natural ordering.
    ///
    /// Integers and decimals compare numerically with each other. Null and
    /// values of different kinds are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Value::Decimal(a), Value::Int64(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Check equality the way filters do: numerics compare across kinds,
    /// null never equals anything.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        matches!(self.compare(other), Some(Ordering::Equal))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int64(100).as_i64(), Some(100));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::Int64(7).as_decimal(), Some(Decimal::from(7)));
        assert_eq!(Value::String("7".into()).as_decimal(), None);
    }

    #[test]
    fn test_value_conversions() {
        let v: Value = true.into();
        assert_eq!(v, Value::Bool(true));

        let v: Value = 42i32.into();
        assert_eq!(v, Value::Int64(42));

        let v: Value = "hello".into();
        assert_eq!(v, Value::String("hello".into()));

        let v: Value = None::<i64>.into();
        assert_eq!(v, Value::Null);
    }

    #[test]
    fn test_decimal_parsing() {
        assert_eq!(
            Value::parse_decimal("10.25").unwrap(),
            Value::Decimal(Decimal::new(1025, 2))
        );
        assert!(Value::parse_decimal("ten").is_err());
        assert!(Value::Bool(true).try_decimal().is_err());
    }

    #[test]
    fn test_compare_mixed_numerics() {
        let ten = Value::Int64(10);
        let ten_and_a_half = Value::Decimal(Decimal::new(1050, 2));

        assert_eq!(ten.compare(&ten_and_a_half), Some(Ordering::Less));
        assert_eq!(ten_and_a_half.compare(&ten), Some(Ordering::Greater));
        assert!(Value::Decimal(Decimal::new(1000, 2)).loosely_equals(&ten));
    }

    #[test]
    fn test_compare_incomparable() {
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Int64(1).compare(&Value::String("1".into())), None);
        assert!(!Value::Null.loosely_equals(&Value::Null));
    }

    #[test]
    fn test_decimal_hash_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(Value::Decimal(Decimal::new(150, 1)), "fifteen");
        assert_eq!(map.get(&Value::Decimal(Decimal::new(1500, 2))), Some(&"fifteen"));
    }
}
