//! Aggregate definitions attached to resources.

use relagg_proto::{AggregateKind, Expr};
use serde::{Deserialize, Serialize};

/// A correlated filter attached to one hop of an aggregate's path.
///
/// `path` is the path prefix ending at the hop the filter applies to.
/// `Field` operands address the hop's destination row and `Parent`
/// operands the hop's source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinFilter {
    /// Relationship path prefix.
    pub path: Vec<String>,
    /// Filter expression.
    pub filter: Expr,
}

/// An aggregate definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDef {
    /// Aggregate name (unique within the owning resource).
    pub name: String,
    /// Aggregate kind.
    pub kind: AggregateKind,
    /// Ordered relationship names from the owning resource.
    #[serde(default)]
    pub relationship_path: Vec<String>,
    /// Target field on the leaf resource.
    #[serde(default)]
    pub field: Option<String>,
    /// Filter over the leaf resource.
    #[serde(default)]
    pub filter: Option<Expr>,
    /// Per-hop correlated filters.
    #[serde(default)]
    pub join_filters: Vec<JoinFilter>,
    /// Whether policies of traversed resources apply.
    #[serde(default = "default_authorize")]
    pub authorize: bool,
    /// Whether non-privileged callers may request this aggregate.
    #[serde(default)]
    pub public: bool,
}

fn default_authorize() -> bool {
    true
}

impl AggregateDef {
    /// Create an aggregate over a relationship path.
    pub fn new<I, S>(name: impl Into<String>, kind: AggregateKind, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            relationship_path: path.into_iter().map(Into::into).collect(),
            field: None,
            filter: None,
            join_filters: Vec::new(),
            authorize: true,
            public: false,
        }
    }

    /// Create an aggregate over the resource's own rows (empty path).
    ///
    /// Only usable with the standalone API.
    pub fn standalone(name: impl Into<String>, kind: AggregateKind) -> Self {
        Self::new(name, kind, Vec::<String>::new())
    }

    /// Create a count aggregate.
    pub fn count<I, S>(name: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, AggregateKind::Count, path)
    }

    /// Set the target field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the leaf filter, conjoining with any existing one.
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.conjoin(filter),
            None => filter,
        });
        self
    }

    /// Attach a join filter to the hop reached by `path`.
    pub fn with_join_filter<I, S>(mut self, path: I, filter: Expr) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.join_filters.push(JoinFilter {
            path: path.into_iter().map(Into::into).collect(),
            filter,
        });
        self
    }

    /// Bypass policy filtering for this aggregate.
    pub fn without_authorization(mut self) -> Self {
        self.authorize = false;
        self
    }

    /// Expose to non-privileged callers.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Number of hops.
    pub fn depth(&self) -> usize {
        self.relationship_path.len()
    }

    /// Combined join filter for hop `index` (zero-based), if any.
    ///
    /// Several filters declared for the same prefix are conjoined.
    pub fn join_filter_for(&self, index: usize) -> Option<Expr> {
        let prefix = self.relationship_path.get(..=index)?;
        let filters: Vec<Expr> = self
            .join_filters
            .iter()
            .filter(|jf| jf.path.as_slice() == prefix)
            .map(|jf| jf.filter.clone())
            .collect();
        if filters.is_empty() {
            None
        } else {
            Some(Expr::and_all(filters))
        }
    }
}
