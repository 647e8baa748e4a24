//! In-memory reference execution adapter.
//!
//! Tables are plain row vectors behind one reader-writer lock. Every plan,
//! batched or not, runs under a single read guard and so sees one
//! consistent snapshot of all tables.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use relagg_proto::{AggregateResult, Expr, Value};
use tracing::trace;

use super::record::{Record, Row};
use crate::catalog::Registry;
use crate::query::{Accumulator, ExecutionAdapter, ExecutionError, FilterEvaluator, QueryPlan};

type Tables = HashMap<String, Vec<Row>>;

/// In-memory tables implementing [`ExecutionAdapter`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an empty table per registered resource.
    pub fn for_registry(registry: &Registry) -> Self {
        let store = Self::new();
        for name in registry.resource_names() {
            store.create_table(name);
        }
        store
    }

    /// Create an empty table if it does not exist.
    pub fn create_table(&self, resource: &str) {
        self.tables.write().entry(resource.to_string()).or_default();
    }

    /// Insert a row.
    pub fn insert(&self, resource: &str, row: Row) -> Result<(), ExecutionError> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(resource)
            .ok_or_else(|| ExecutionError::UnknownResource(resource.to_string()))?;
        table.push(row);
        Ok(())
    }

    /// Insert a row given as `(attribute, value)` pairs.
    pub fn insert_pairs<I, K, V>(&self, resource: &str, pairs: I) -> Result<(), ExecutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert(resource, Record::from_pairs(pairs).fields)
    }

    /// Number of rows in a table.
    pub fn len(&self, resource: &str) -> Result<usize, ExecutionError> {
        let tables = self.tables.read();
        table(&tables, resource).map(Vec::len)
    }

    /// Fetch the rows of `resource` matching `filter` as records.
    pub fn select(&self, resource: &str, filter: &Expr) -> Result<Vec<Record>, ExecutionError> {
        let tables = self.tables.read();
        let mut records = Vec::new();
        for row in table(&tables, resource)? {
            if FilterEvaluator::matches(filter, row, None)? {
                records.push(Record::new(row.clone()));
            }
        }
        Ok(records)
    }
}

fn table<'t>(tables: &'t Tables, resource: &str) -> Result<&'t Vec<Row>, ExecutionError> {
    tables
        .get(resource)
        .ok_or_else(|| ExecutionError::UnknownResource(resource.to_string()))
}

/// Root rows of a plan that pass its root filter.
fn roots<'t>(tables: &'t Tables, plan: &QueryPlan) -> Result<Vec<&'t Row>, ExecutionError> {
    let mut matched = Vec::new();
    for row in table(tables, &plan.root.resource)? {
        if FilterEvaluator::matches(&plan.root.filter, row, None)? {
            matched.push(row);
        }
    }
    Ok(matched)
}

/// Walk the join chain from one root row and feed every leaf row.
///
/// Leaves reachable through several intermediate rows are fed once per path.
fn fold_root(
    tables: &Tables,
    plan: &QueryPlan,
    root: &Row,
    acc: &mut Accumulator,
) -> Result<(), ExecutionError> {
    let mut frontier: Vec<&Row> = vec![root];
    for step in &plan.joins {
        let target = table(tables, &step.target)?;
        let mut next = Vec::new();
        for parent in &frontier {
            let Some(key) = parent
                .get(&step.join.source_attribute)
                .filter(|v| !v.is_null())
            else {
                continue;
            };
            for row in target {
                let joined = row
                    .get(&step.join.destination_attribute)
                    .is_some_and(|v| v.loosely_equals(key));
                if joined && FilterEvaluator::matches(&step.predicate, row, Some(*parent))? {
                    next.push(row);
                }
            }
        }
        trace!(step = %step.relationship, rows = next.len(), "joined");
        frontier = next;
    }

    for leaf in frontier {
        let value = plan
            .aggregation
            .field
            .as_ref()
            .map(|field| leaf.get(field).unwrap_or(&Value::Null));
        acc.push(value)?;
    }
    Ok(())
}

impl ExecutionAdapter for MemoryStore {
    fn execute(&self, plan: &QueryPlan) -> Result<AggregateResult, ExecutionError> {
        let tables = self.tables.read();
        let mut acc = Accumulator::new(plan.aggregation.kind);
        for root in roots(&tables, plan)? {
            fold_root(&tables, plan, root, &mut acc)?;
        }
        Ok(AggregateResult::new(
            plan.name.clone(),
            plan.aggregation.kind,
            acc.finish()?,
        ))
    }

    fn execute_batch(
        &self,
        plan: &QueryPlan,
        identities: &[Value],
    ) -> Result<HashMap<Value, AggregateResult>, ExecutionError> {
        let wanted: HashSet<&Value> = identities.iter().collect();
        let tables = self.tables.read();

        let mut accumulators: HashMap<Value, Accumulator> = HashMap::new();
        for root in roots(&tables, plan)? {
            let Some(identity) = root.get(&plan.root.identity_field) else {
                continue;
            };
            if !wanted.contains(identity) {
                continue;
            }
            let acc = accumulators
                .entry(identity.clone())
                .or_insert_with(|| Accumulator::new(plan.aggregation.kind));
            fold_root(&tables, plan, root, acc)?;
        }

        accumulators
            .into_iter()
            .map(|(identity, acc)| -> Result<_, ExecutionError> {
                let value = acc.finish()?;
                Ok((
                    identity,
                    AggregateResult::new(plan.name.clone(), plan.aggregation.kind, value),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Cardinality, JoinCondition};
    use crate::query::{Aggregation, JoinStep, PlanShape, RootSource};
    use relagg_proto::AggregateKind;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table("User");
        store.create_table("Post");
        store.insert_pairs("User", [("id", 1)]).unwrap();
        store.insert_pairs("User", [("id", 2)]).unwrap();
        for (id, author, score) in [(10, 1, Some(5)), (11, 1, None), (12, 1, Some(7)), (13, 2, Some(1))] {
            store
                .insert(
                    "Post",
                    Record::from_pairs([
                        ("id", Value::from(id)),
                        ("author_id", Value::from(author)),
                        ("score", Value::from(score)),
                    ])
                    .fields,
                )
                .unwrap();
        }
        store
    }

    fn plan(kind: AggregateKind, field: Option<&str>, predicate: Expr) -> QueryPlan {
        QueryPlan {
            name: "agg".into(),
            root: RootSource {
                resource: "User".into(),
                identity_field: "id".into(),
                filter: Expr::True,
            },
            joins: vec![JoinStep {
                source: "User".into(),
                relationship: "posts".into(),
                target: "Post".into(),
                cardinality: Cardinality::HasMany,
                join: JoinCondition {
                    source_attribute: "id".into(),
                    destination_attribute: "author_id".into(),
                },
                predicate,
            }],
            aggregation: Aggregation {
                kind,
                field: field.map(str::to_string),
            },
            shape: PlanShape::Execute,
        }
    }

    #[test]
    fn test_execute() {
        let store = store();
        let count = store.execute(&plan(AggregateKind::Count, None, Expr::True)).unwrap();
        assert_eq!(count.value, Value::Int64(4));

        let sum = store
            .execute(&plan(AggregateKind::Sum, Some("score"), Expr::True))
            .unwrap();
        assert_eq!(sum.value, Value::Int64(13));

        let filtered = store
            .execute(&plan(AggregateKind::Count, None, Expr::gt("score", 4)))
            .unwrap();
        assert_eq!(filtered.value, Value::Int64(2));
    }

    #[test]
    fn test_execute_batch() {
        let store = store();
        let results = store
            .execute_batch(
                &plan(AggregateKind::Max, Some("score"), Expr::True),
                &[Value::from(1), Value::from(2), Value::from(3)],
            )
            .unwrap();

        assert_eq!(results[&Value::from(1)].value, Value::Int64(7));
        assert_eq!(results[&Value::from(2)].value, Value::Int64(1));
        assert!(!results.contains_key(&Value::from(3)));
    }

    #[test]
    fn test_unknown_table() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.insert_pairs("Ghost", [("id", 1)]),
            Err(ExecutionError::UnknownResource(_))
        ));
        assert!(store.execute(&plan(AggregateKind::Count, None, Expr::True)).is_err());
    }

    #[test]
    fn test_select() {
        let store = store();
        let records = store.select("Post", &Expr::eq("author_id", 1)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(store.len("Post").unwrap(), 4);
    }
}
