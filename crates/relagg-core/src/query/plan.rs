//! Logical aggregate plans.
//!
//! A plan is built fresh per request and handed to an execution adapter.
//! It carries fully resolved predicates; adapters never consult policies,
//! tenancy or the catalog.

use std::fmt;

use relagg_proto::{AggregateKind, AggregateResult, Expr};

use crate::catalog::{Cardinality, JoinCondition};

/// Root row set of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RootSource {
    /// Root resource name.
    pub resource: String,
    /// Identity attribute, used to key batched results.
    pub identity_field: String,
    /// Action base filter, tenant predicate and root policy, conjoined.
    pub filter: Expr,
}

/// One join from the previous scope to the next resource.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    /// Source resource name.
    pub source: String,
    /// Relationship traversed.
    pub relationship: String,
    /// Target resource name.
    pub target: String,
    /// Relationship cardinality.
    pub cardinality: Cardinality,
    /// Structural join condition.
    pub join: JoinCondition,
    /// Policy, join filter, tenant and (on the last step) leaf filter.
    /// `Parent` operands address the source row.
    pub predicate: Expr,
}

/// Aggregation operator applied to leaf rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Aggregate kind.
    pub kind: AggregateKind,
    /// Target field on the leaf resource; `None` counts rows.
    pub field: Option<String>,
}

/// Whether a plan needs to run at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanShape {
    /// Execute against storage.
    Execute,
    /// Statically known to match nothing.
    Empty,
}

/// A logical aggregate plan.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Result name.
    pub name: String,
    /// Root row set.
    pub root: RootSource,
    /// Join chain, in path order.
    pub joins: Vec<JoinStep>,
    /// Aggregation operator.
    pub aggregation: Aggregation,
    /// Execution shape.
    pub shape: PlanShape,
}

impl QueryPlan {
    /// Check if the plan is statically empty.
    pub fn is_empty(&self) -> bool {
        self.shape == PlanShape::Empty
    }

    /// Name of the resource whose rows are aggregated.
    pub fn leaf_resource(&self) -> &str {
        self.joins
            .last()
            .map(|j| j.target.as_str())
            .unwrap_or(self.root.resource.as_str())
    }

    /// The "no match" result of this plan.
    pub fn empty_result(&self) -> AggregateResult {
        AggregateResult::empty(self.name.clone(), self.aggregation.kind)
    }

    /// Check if any predicate in the plan is constant false.
    pub(crate) fn has_false_predicate(&self) -> bool {
        self.root.filter.is_false() || self.joins.iter().any(|j| j.predicate.is_false())
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.aggregation.kind.name())?;
        if let Some(field) = &self.aggregation.field {
            write!(f, "({field})")?;
        }
        if self.is_empty() {
            write!(f, " [empty]")?;
        }
        writeln!(f)?;
        writeln!(f, "  root {} where {:?}", self.root.resource, self.root.filter)?;
        for step in &self.joins {
            writeln!(
                f,
                "  join {}.{} -> {} on {} = {} where {:?}",
                step.source,
                step.relationship,
                step.target,
                step.join.source_attribute,
                step.join.destination_attribute,
                step.predicate
            )?;
        }
        Ok(())
    }
}
