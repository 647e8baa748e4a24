//! The caller-facing aggregate API.

use std::sync::Arc;

use relagg_proto::{AggregateKind, AggregateResult, Value};
use tracing::debug;

use super::cache::PathCache;
use super::executor::ExecutionAdapter;
use super::loader::{LoadOutcome, Loader};
use super::plan::QueryPlan;
use super::planner::{AggregatePlanner, PlanScope};
use crate::catalog::{AggregateDef, Registry};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::security::{AggregateContext, PolicyEvaluator, RlsPolicyEvaluator};
use crate::storage::Record;

/// Plans aggregates against a registry and runs them through an adapter.
///
/// The engine holds no per-request state; it can be shared across threads
/// behind an `Arc` and called concurrently.
pub struct AggregateEngine {
    registry: Arc<Registry>,
    adapter: Arc<dyn ExecutionAdapter>,
    evaluator: Arc<dyn PolicyEvaluator>,
    cache: PathCache,
    config: EngineConfig,
}

impl AggregateEngine {
    /// Create an engine using the row-level policies of each resource.
    pub fn new(registry: Arc<Registry>, adapter: Arc<dyn ExecutionAdapter>) -> Self {
        Self {
            registry,
            adapter,
            evaluator: Arc::new(RlsPolicyEvaluator),
            cache: PathCache::new(),
            config: EngineConfig::default(),
        }
    }

    /// Use a custom policy evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The structural path cache.
    pub fn path_cache(&self) -> &PathCache {
        &self.cache
    }

    fn planner(&self) -> AggregatePlanner<'_> {
        let planner = AggregatePlanner::new(&self.registry, self.evaluator.as_ref(), &self.config);
        if self.config.path_cache {
            planner.with_cache(&self.cache)
        } else {
            planner
        }
    }

    /// Build the standalone plan for `aggregate` on `resource` without running it.
    pub fn plan(
        &self,
        resource: &str,
        aggregate: &AggregateDef,
        ctx: &AggregateContext,
    ) -> Result<QueryPlan> {
        let resource = self.registry.resource(resource)?;
        self.planner().plan(resource, aggregate, ctx, PlanScope::Query)
    }

    /// Compute `aggregate` over every row the root read action yields.
    ///
    /// The aggregate need not be defined on the resource; its path may be
    /// empty to aggregate the resource's own rows.
    pub fn aggregate(
        &self,
        resource: &str,
        aggregate: &AggregateDef,
        ctx: &AggregateContext,
    ) -> Result<AggregateResult> {
        let plan = self.plan(resource, aggregate, ctx)?;
        if plan.is_empty() {
            debug!(resource, aggregate = %plan.name, "short-circuited empty aggregate");
            return Ok(plan.empty_result());
        }
        Ok(self.adapter.execute(&plan)?)
    }

    /// Compute a defined aggregate standalone, over all root rows.
    pub fn aggregate_defined(
        &self,
        resource: &str,
        name: &str,
        ctx: &AggregateContext,
    ) -> Result<AggregateResult> {
        let def = self.registry.resource(resource)?;
        let aggregate = self.planner().aggregate_def(def, name, ctx)?;
        self.aggregate(resource, aggregate, ctx)
    }

    fn simple(
        &self,
        resource: &str,
        kind: AggregateKind,
        field: Option<&str>,
        ctx: &AggregateContext,
    ) -> Result<Value> {
        let mut aggregate = AggregateDef::standalone(kind.name(), kind);
        if let Some(field) = field {
            aggregate = aggregate.with_field(field);
        }
        Ok(self.aggregate(resource, &aggregate, ctx)?.value)
    }

    /// Count the rows the root read action yields.
    pub fn count(&self, resource: &str, ctx: &AggregateContext) -> Result<Value> {
        self.simple(resource, AggregateKind::Count, None, ctx)
    }

    /// Sum `field` over the rows the root read action yields.
    pub fn sum(&self, resource: &str, field: &str, ctx: &AggregateContext) -> Result<Value> {
        self.simple(resource, AggregateKind::Sum, Some(field), ctx)
    }

    /// Minimum of `field`.
    pub fn min(&self, resource: &str, field: &str, ctx: &AggregateContext) -> Result<Value> {
        self.simple(resource, AggregateKind::Min, Some(field), ctx)
    }

    /// Maximum of `field`.
    pub fn max(&self, resource: &str, field: &str, ctx: &AggregateContext) -> Result<Value> {
        self.simple(resource, AggregateKind::Max, Some(field), ctx)
    }

    /// Exact average of `field`.
    pub fn avg(&self, resource: &str, field: &str, ctx: &AggregateContext) -> Result<Value> {
        self.simple(resource, AggregateKind::Avg, Some(field), ctx)
    }

    /// Load the named aggregates onto already-fetched records of `resource`.
    pub fn load<S: AsRef<str>>(
        &self,
        resource: &str,
        records: Vec<Record>,
        names: &[S],
        ctx: &AggregateContext,
    ) -> Result<LoadOutcome> {
        let def = self.registry.resource(resource)?;
        let planner = self.planner();
        Loader::new(&planner, self.adapter.as_ref()).load(def, records, names, ctx)
    }
}
