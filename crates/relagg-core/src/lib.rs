//! relagg core - authorization-aware, tenant-scoped relationship aggregates.
//!
//! This crate rewrites a logical aggregate request (count, sum, min, max,
//! avg over a relationship path) into a filtered join plan that respects
//! the policies of every traversed resource, tenant scoping and per-hop
//! correlated join filters, then runs it through an execution adapter.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod config;
pub mod error;
pub mod query;
pub mod security;
pub mod storage;

pub use catalog::{
    ActionDef, ActionType, AggregateDef, AttributeDef, Cardinality, JoinCondition, JoinFilter,
    Multitenancy, Registry, RegistryBuilder, RelationDef, RelationshipCatalog,
    RelationshipResolution, ResourceDef, ScalarType, SchemaDocument, Visibility,
};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use query::{
    AggregateEngine, AggregatePlanner, ExecutionAdapter, ExecutionError, LoadOutcome, PlanScope,
    PlanShape, QueryPlan,
};
pub use security::{
    Actor, AggregateContext, PolicyDecision, PolicyEvaluator, PolicyExpr, PolicyType, RlsPolicy,
    RlsPolicyEvaluator, SecurityError,
};
pub use storage::{MemoryStore, Record, Row};

pub use relagg_proto::{AggregateKind, AggregateResult, Expr, Value};
