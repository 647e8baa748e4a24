//! Aggregate kinds and results.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Aggregate function kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    /// Count of matching rows.
    Count,
    /// Sum of numeric values.
    Sum,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
    /// Average of numeric values.
    Avg,
}

impl AggregateKind {
    /// Lowercase name, also the default result name of the convenience calls.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Count => "count",
            AggregateKind::Sum => "sum",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
            AggregateKind::Avg => "avg",
        }
    }

    /// Parse a kind from its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "count" => Some(AggregateKind::Count),
            "sum" => Some(AggregateKind::Sum),
            "min" => Some(AggregateKind::Min),
            "max" => Some(AggregateKind::Max),
            "avg" => Some(AggregateKind::Avg),
            _ => None,
        }
    }

    /// Whether this kind needs a target field.
    pub fn requires_field(&self) -> bool {
        !matches!(self, AggregateKind::Count)
    }

    /// Whether this kind only accepts numeric fields.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggregateKind::Sum | AggregateKind::Avg)
    }

    /// Result over an empty input set: `0` for count, null otherwise.
    pub fn empty_value(&self) -> Value {
        match self {
            AggregateKind::Count => Value::Int64(0),
            _ => Value::Null,
        }
    }
}

/// Result of one named aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Requested aggregate name.
    pub name: String,
    /// Aggregate kind.
    pub kind: AggregateKind,
    /// Computed value (integer for count; numeric, ordered or null otherwise).
    pub value: Value,
}

impl AggregateResult {
    /// Create a result.
    pub fn new(name: impl Into<String>, kind: AggregateKind, value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
        }
    }

    /// The "no match" result for a kind.
    pub fn empty(name: impl Into<String>, kind: AggregateKind) -> Self {
        Self::new(name, kind, kind.empty_value())
    }
}
