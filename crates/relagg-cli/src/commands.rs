//! Command execution against the in-memory adapter.

use std::sync::Arc;

use relagg_core::{
    AggregateContext, AggregateDef, AggregateEngine, AggregateKind, MemoryStore, Registry,
};
use tracing::info;

use crate::config::{split_path, CliConfig, Command};
use crate::dataset::{load_actor_file, load_store_file, tenant_value};
use crate::error::CliError;
use crate::formatter::{create_formatter, Formatter, LoadedView};

/// An engine over a loaded dataset.
pub struct Session {
    engine: AggregateEngine,
    store: Arc<MemoryStore>,
}

impl Session {
    /// Build a session from an already-loaded registry and store.
    pub fn new(registry: Registry, store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let engine = AggregateEngine::new(Arc::new(registry), store.clone());
        Self { engine, store }
    }

    /// Load the schema and dataset files named by `config`.
    pub fn open(config: &CliConfig) -> Result<Self, CliError> {
        let registry = Registry::from_file(&config.schema_path)?;
        let store = load_store_file(&registry, &config.data_path)?;
        info!(
            resources = registry.len(),
            schema_version = registry.version(),
            "dataset loaded"
        );
        Ok(Self::new(registry, store))
    }

    /// Build the per-call context for a root resource.
    pub fn context(
        &self,
        config: &CliConfig,
        resource: &str,
        action: Option<&str>,
    ) -> Result<AggregateContext, CliError> {
        let def = self.engine.registry().resource(resource)?;
        let mut ctx = AggregateContext::new().with_authorize(config.authorize);
        if config.public_only {
            ctx = ctx.public_only();
        }
        if let Some(tenant) = &config.tenant {
            ctx = ctx.with_tenant(tenant_value(def, tenant));
        }
        if let Some(path) = &config.actor_path {
            ctx = ctx.with_actor(load_actor_file(path)?);
        }
        if let Some(action) = action {
            ctx = ctx.with_action(action);
        }
        Ok(ctx)
    }

    /// Run a command and render its output.
    pub fn execute(
        &self,
        config: &CliConfig,
        formatter: &dyn Formatter,
    ) -> Result<String, CliError> {
        match &config.command {
            Command::Aggregate {
                resource,
                kind,
                field,
                path,
                action,
                explain,
            } => {
                let ctx = self.context(config, resource, action.as_deref())?;
                let mut aggregate =
                    AggregateDef::new(kind.name(), *kind, split_path(path.as_deref()));
                if let Some(field) = field {
                    aggregate = aggregate.with_field(field.as_str());
                }
                if *explain {
                    return Ok(self.engine.plan(resource, &aggregate, &ctx)?.to_string());
                }
                let result = self.engine.aggregate(resource, &aggregate, &ctx)?;
                Ok(formatter.format_aggregate(&result))
            }
            Command::Load {
                resource,
                aggregates,
            } => {
                let ctx = self.context(config, resource, None)?;
                let def = self.engine.registry().resource(resource)?;

                // Fetch the root rows the caller may read, then load onto them.
                let root = AggregateDef::standalone("rows", AggregateKind::Count);
                let plan = self.engine.plan(resource, &root, &ctx)?;
                let records = self.store.select(resource, &plan.root.filter)?;

                let outcome = self.engine.load(resource, records, aggregates.as_slice(), &ctx)?;
                Ok(formatter.format_loaded(&LoadedView {
                    identity_field: &def.identity_field,
                    names: aggregates,
                    records: &outcome.records,
                    errors: &outcome.errors,
                }))
            }
        }
    }
}

/// Open the dataset, run the configured command and render the output.
pub fn run(config: &CliConfig) -> Result<String, CliError> {
    let session = Session::open(config)?;
    let formatter = create_formatter(config.format);
    session.execute(config, &*formatter)
}
