//! Core type definitions for the catalog.

use relagg_proto::Value;
use serde::{Deserialize, Serialize};

/// Scalar data types an attribute may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// UTF-8 string.
    String,
    /// Boolean value.
    Bool,
    /// 64-bit signed integer.
    Integer,
    /// Exact decimal.
    Decimal,
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Integer | ScalarType::Decimal)
    }

    /// Check if a value fits this type. Null fits every type.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ScalarType::String, Value::String(_))
                | (ScalarType::Bool, Value::Bool(_))
                | (ScalarType::Integer, Value::Int64(_))
                | (ScalarType::Decimal, Value::Decimal(_) | Value::Int64(_))
        )
    }

    /// Get the type name for display.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Bool => "boolean",
            ScalarType::Integer => "integer",
            ScalarType::Decimal => "decimal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_numeric_types() {
        assert!(ScalarType::Integer.is_numeric());
        assert!(ScalarType::Decimal.is_numeric());
        assert!(!ScalarType::String.is_numeric());
        assert!(!ScalarType::Bool.is_numeric());
    }

    #[test]
    fn test_accepts() {
        assert!(ScalarType::Integer.accepts(&Value::Int64(1)));
        assert!(ScalarType::Integer.accepts(&Value::Null));
        assert!(!ScalarType::Integer.accepts(&Value::Decimal(Decimal::ONE)));
        assert!(ScalarType::Decimal.accepts(&Value::Int64(1)));
        assert!(!ScalarType::Bool.accepts(&Value::String("true".into())));
    }
}
