//! Aggregate planning and execution.
//!
//! # Architecture
//!
//! ```text
//! AggregateDef + AggregateContext
//!         │
//!         ▼
//!   PathResolver ──── PolicyEvaluator, TenantScoper, PathCache
//!         │
//!         ▼
//!  AggregatePlanner ──► QueryPlan (Execute | Empty)
//!         │
//!         ▼
//!  ExecutionAdapter ──► AggregateResult / per-identity results
//!         │
//!         ▼
//!      Loader ──► Record aggregate slots
//! ```

pub mod accumulator;
pub mod cache;
pub mod engine;
pub mod executor;
pub mod filter;
pub mod loader;
pub mod path;
pub mod plan;
pub mod planner;
pub mod tenant;

pub use accumulator::Accumulator;
pub use cache::{CacheStats, PathCache};
pub use engine::AggregateEngine;
pub use executor::{ExecutionAdapter, ExecutionError};
pub use filter::{FilterEvaluator, Truth};
pub use loader::{LoadOutcome, Loader};
pub use path::{PathResolver, ResolvedHop, ResolvedPath};
pub use plan::{Aggregation, JoinStep, PlanShape, QueryPlan, RootSource};
pub use planner::{AggregatePlanner, PlanScope};
pub use tenant::TenantScoper;
