//! Field-loading mode: aggregates written onto fetched records.

use std::collections::{BTreeMap, HashMap, HashSet};

use relagg_proto::{AggregateKind, AggregateResult, Value};
use tracing::{debug, warn};

use super::executor::ExecutionAdapter;
use super::planner::{AggregatePlanner, PlanScope};
use crate::catalog::ResourceDef;
use crate::error::{Error, Result};
use crate::security::AggregateContext;
use crate::storage::Record;

/// Records with their aggregate slots filled, plus per-name failures.
#[derive(Debug)]
pub struct LoadOutcome {
    /// The input records, in input order.
    pub records: Vec<Record>,
    /// Aggregates that failed, by name. Their slots are left untouched.
    pub errors: BTreeMap<String, Error>,
}

impl LoadOutcome {
    /// Check if every requested aggregate loaded.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Loads aggregates for batches of records of one resource.
pub struct Loader<'a> {
    planner: &'a AggregatePlanner<'a>,
    adapter: &'a dyn ExecutionAdapter,
}

impl<'a> Loader<'a> {
    /// Create a loader.
    pub fn new(planner: &'a AggregatePlanner<'a>, adapter: &'a dyn ExecutionAdapter) -> Self {
        Self { planner, adapter }
    }

    /// Load the named aggregates onto `records`.
    ///
    /// Each aggregate is planned and executed on its own; a failure is
    /// recorded under its name and does not affect sibling aggregates.
    /// Records with no matching rows receive the kind's empty value.
    /// Only a record without an identity fails the whole call.
    pub fn load<S: AsRef<str>>(
        &self,
        resource: &ResourceDef,
        mut records: Vec<Record>,
        names: &[S],
        ctx: &AggregateContext,
    ) -> Result<LoadOutcome> {
        let mut identities = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();
        for record in &records {
            let identity = record
                .identity(&resource.identity_field)
                .ok_or_else(|| Error::MissingIdentity {
                    resource: resource.name.clone(),
                })?;
            if seen.insert(identity) {
                identities.push(identity.clone());
            }
        }

        let mut requested = HashSet::new();
        let mut errors = BTreeMap::new();
        for name in names.iter().map(AsRef::as_ref) {
            if !requested.insert(name) {
                continue;
            }
            match self.load_one(resource, name, &identities, ctx) {
                Ok((kind, results)) => {
                    for record in &mut records {
                        let value = record
                            .identity(&resource.identity_field)
                            .and_then(|id| results.get(id))
                            .map(|r| r.value.clone())
                            .unwrap_or_else(|| kind.empty_value());
                        record.set_aggregate(name, value);
                    }
                }
                Err(err) => {
                    warn!(
                        resource = %resource.name,
                        aggregate = name,
                        error = %err,
                        "failed to load aggregate"
                    );
                    errors.insert(name.to_string(), err);
                }
            }
        }

        Ok(LoadOutcome { records, errors })
    }

    fn load_one(
        &self,
        resource: &ResourceDef,
        name: &str,
        identities: &[Value],
        ctx: &AggregateContext,
    ) -> Result<(AggregateKind, HashMap<Value, AggregateResult>)> {
        let aggregate = self.planner.aggregate_def(resource, name, ctx)?;
        let plan = self.planner.plan(resource, aggregate, ctx, PlanScope::Records)?;
        if plan.is_empty() || identities.is_empty() {
            debug!(
                resource = %resource.name,
                aggregate = name,
                "skipped execution of empty aggregate"
            );
            return Ok((aggregate.kind, HashMap::new()));
        }
        let results = self.adapter.execute_batch(&plan, identities)?;
        Ok((aggregate.kind, results))
    }
}
