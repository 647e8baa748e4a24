//! Relationship path resolution.
//!
//! The resolver only walks the finite path it is given; self-referencing
//! resources need no cycle handling because nothing is inferred.

use std::sync::Arc;

use relagg_proto::Expr;

use super::cache::PathCache;
use super::tenant::TenantScoper;
use crate::catalog::{
    AggregateDef, Cardinality, JoinCondition, Registry, RelationshipResolution, ResourceDef,
};
use crate::error::Result;
use crate::security::{AggregateContext, PolicyDecision, PolicyEvaluator};

/// One resolved hop of a relationship path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHop {
    /// Zero-based position in the path.
    pub index: usize,
    /// Source resource (the parent scope of the join filter).
    pub source: String,
    /// Target resource.
    pub target: String,
    /// Relationship name.
    pub relationship: String,
    /// Relationship cardinality.
    pub cardinality: Cardinality,
    /// Structural join condition.
    pub join: JoinCondition,
    /// Policy decision for the target's primary read action, when authorizing.
    pub policy: Option<PolicyDecision>,
    /// Caller-supplied correlated filter.
    pub join_filter: Option<Expr>,
    /// Tenant predicate for non-global multitenant targets.
    pub tenant: Option<Expr>,
}

impl ResolvedHop {
    /// Check if the policy denies every row at this hop.
    pub fn is_denied(&self) -> bool {
        self.policy.as_ref().is_some_and(PolicyDecision::is_deny_all)
    }

    /// Policy, join filter and tenant predicates, conjoined.
    pub fn predicate(&self) -> Expr {
        let policy = self.policy.as_ref().map(PolicyDecision::to_expr);
        Expr::and_all(
            [policy, self.join_filter.clone(), self.tenant.clone()]
                .into_iter()
                .flatten(),
        )
    }
}

/// A fully resolved relationship path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    /// Owning resource.
    pub owner: String,
    /// Hops, in path order.
    pub hops: Vec<ResolvedHop>,
}

impl ResolvedPath {
    /// Name of the leaf resource.
    pub fn leaf(&self) -> &str {
        self.hops
            .last()
            .map(|h| h.target.as_str())
            .unwrap_or(self.owner.as_str())
    }

    /// Check if any hop is denied outright.
    pub fn is_denied(&self) -> bool {
        self.hops.iter().any(ResolvedHop::is_denied)
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Check if the path has no hops.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }
}

/// Resolves an aggregate's relationship path into authorized hops.
pub struct PathResolver<'a> {
    registry: &'a Registry,
    evaluator: &'a dyn PolicyEvaluator,
    cache: Option<&'a PathCache>,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver without a cache.
    pub fn new(registry: &'a Registry, evaluator: &'a dyn PolicyEvaluator) -> Self {
        Self {
            registry,
            evaluator,
            cache: None,
        }
    }

    /// Use a path cache for structural resolution.
    pub fn with_cache(mut self, cache: &'a PathCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Resolve the relationship structure of `path` from `owner`.
    pub fn structure(
        &self,
        owner: &str,
        path: &[String],
    ) -> Result<Arc<Vec<RelationshipResolution>>> {
        match self.cache {
            Some(cache) => cache.get_or_resolve(owner, path, || self.registry.walk(owner, path)),
            None => Ok(Arc::new(self.registry.walk(owner, path)?)),
        }
    }

    /// Resolve `aggregate`'s path from `owner` for the given context.
    ///
    /// Each hop's policy is evaluated independently against the target's
    /// primary read action. Policies are skipped entirely when either the
    /// aggregate or the context disables authorization.
    pub fn resolve(
        &self,
        owner: &ResourceDef,
        aggregate: &AggregateDef,
        ctx: &AggregateContext,
    ) -> Result<ResolvedPath> {
        let structure = self.structure(&owner.name, &aggregate.relationship_path)?;
        let authorize = aggregate.authorize && ctx.authorize;

        let mut hops = Vec::with_capacity(structure.len());
        for (index, step) in structure.iter().enumerate() {
            let target = self.registry.resource(&step.destination)?;
            let policy = if authorize {
                let action = target.read_action(None)?;
                let decision = self.evaluator.evaluate(ctx.actor(), action, target)?;
                tracing::trace!(
                    aggregate = %aggregate.name,
                    hop = index,
                    target = %target.name,
                    decision = ?decision,
                    "evaluated hop policy"
                );
                Some(decision)
            } else {
                None
            };

            hops.push(ResolvedHop {
                index,
                source: step.source.clone(),
                target: step.destination.clone(),
                relationship: step.relationship.clone(),
                cardinality: step.cardinality,
                join: step.join.clone(),
                policy,
                join_filter: aggregate.join_filter_for(index),
                tenant: TenantScoper::hop_predicate(target, ctx)?,
            });
        }

        Ok(ResolvedPath {
            owner: owner.name.clone(),
            hops,
        })
    }
}
