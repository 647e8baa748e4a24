//! Aggregate planning.
//!
//! Planning is pure: it reads the immutable registry and calls the policy
//! evaluator, and may run concurrently for independent requests.

use relagg_proto::Expr;
use tracing::debug;

use super::cache::PathCache;
use super::path::PathResolver;
use super::plan::{Aggregation, JoinStep, PlanShape, QueryPlan, RootSource};
use super::tenant::TenantScoper;
use crate::catalog::{AggregateDef, Registry, ResourceDef};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::security::{AggregateContext, PolicyEvaluator};

/// Which root rows a plan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanScope {
    /// Standalone aggregate over every row the root read action yields.
    ///
    /// The root filter is the action's base filter, the tenant predicate
    /// and the root policy.
    Query,
    /// Aggregate per already-fetched (and already-authorized) record.
    ///
    /// The root filter is the tenant predicate only; identities are
    /// supplied to the batched execution.
    Records,
}

/// Builds query plans from aggregate definitions.
pub struct AggregatePlanner<'a> {
    registry: &'a Registry,
    evaluator: &'a dyn PolicyEvaluator,
    cache: Option<&'a PathCache>,
    config: &'a EngineConfig,
}

impl<'a> AggregatePlanner<'a> {
    /// Create a planner.
    pub fn new(
        registry: &'a Registry,
        evaluator: &'a dyn PolicyEvaluator,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            registry,
            evaluator,
            cache: None,
            config,
        }
    }

    /// Use a path cache.
    pub fn with_cache(mut self, cache: &'a PathCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The registry this planner reads.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Look up a defined aggregate visible to the caller.
    ///
    /// With `public_only` set, private aggregates are reported as undefined.
    pub fn aggregate_def<'r>(
        &self,
        resource: &'r ResourceDef,
        name: &str,
        ctx: &AggregateContext,
    ) -> Result<&'r AggregateDef> {
        resource
            .get_aggregate(name)
            .filter(|agg| agg.public || !ctx.public_only)
            .ok_or_else(|| Error::UnknownAggregate {
                resource: resource.name.clone(),
                aggregate: name.to_string(),
            })
    }

    /// Build the plan for `aggregate` on `resource`.
    pub fn plan(
        &self,
        resource: &ResourceDef,
        aggregate: &AggregateDef,
        ctx: &AggregateContext,
        scope: PlanScope,
    ) -> Result<QueryPlan> {
        if aggregate.depth() > self.config.max_path_depth {
            return Err(Error::PathTooDeep {
                depth: aggregate.depth(),
                max: self.config.max_path_depth,
            });
        }
        self.registry.validate_aggregate(resource, aggregate)?;

        let mut resolver = PathResolver::new(self.registry, self.evaluator);
        if let Some(cache) = self.cache {
            resolver = resolver.with_cache(cache);
        }
        let path = resolver.resolve(resource, aggregate, ctx)?;

        let leaf = self.registry.resource(path.leaf())?;
        if ctx.public_only {
            if let Some(field) = &aggregate.field {
                if leaf.get_attribute(field).is_some_and(|a| !a.is_public()) {
                    return Err(Error::UnknownAttribute {
                        resource: leaf.name.clone(),
                        attribute: field.clone(),
                    });
                }
            }
        }

        let tenant = TenantScoper::root_predicate(resource, ctx)?;
        let mut root_filter = match scope {
            PlanScope::Query => {
                let action = resource.read_action(ctx.action.as_deref())?;
                let policy = if ctx.authorize && aggregate.authorize {
                    let decision = self.evaluator.evaluate(ctx.actor(), action, resource)?;
                    tracing::trace!(
                        resource = %resource.name,
                        action = %action.name,
                        decision = ?decision,
                        "evaluated root policy"
                    );
                    Some(decision.to_expr())
                } else {
                    None
                };
                Expr::and_all([Some(action.filter()), tenant, policy].into_iter().flatten())
            }
            PlanScope::Records => {
                // Rows are supplied by the caller; the action must still exist.
                resource.read_action(ctx.action.as_deref())?;
                tenant.unwrap_or(Expr::True)
            }
        };

        let mut joins: Vec<JoinStep> = path
            .hops
            .iter()
            .map(|hop| JoinStep {
                source: hop.source.clone(),
                relationship: hop.relationship.clone(),
                target: hop.target.clone(),
                cardinality: hop.cardinality,
                join: hop.join.clone(),
                predicate: hop.predicate(),
            })
            .collect();

        if let Some(filter) = &aggregate.filter {
            match joins.last_mut() {
                Some(last) => last.predicate = last.predicate.clone().conjoin(filter.clone()),
                None => root_filter = root_filter.conjoin(filter.clone()),
            }
        }

        let mut plan = QueryPlan {
            name: aggregate.name.clone(),
            root: RootSource {
                resource: resource.name.clone(),
                identity_field: resource.identity_field.clone(),
                filter: root_filter,
            },
            joins,
            aggregation: Aggregation {
                kind: aggregate.kind,
                field: aggregate.field.clone(),
            },
            shape: PlanShape::Execute,
        };
        if self.config.short_circuit_denied && plan.has_false_predicate() {
            plan.shape = PlanShape::Empty;
        }

        debug!(
            resource = %resource.name,
            aggregate = %aggregate.name,
            hops = plan.joins.len(),
            shape = ?plan.shape,
            "planned aggregate"
        );
        Ok(plan)
    }
}
