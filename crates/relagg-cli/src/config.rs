//! Command-line arguments and run configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relagg_core::AggregateKind;

use crate::formatter::OutputFormat;

/// Separator between relationship names in `--path`.
pub const PATH_SEPARATOR: char = '.';

/// relagg command-line client.
#[derive(Parser, Debug)]
#[command(name = "relagg")]
#[command(version, about = "Authorization-aware relationship aggregates", long_about = None)]
pub struct Args {
    /// JSON schema document describing resources.
    #[arg(short, long)]
    pub schema: PathBuf,

    /// JSON dataset: resource name to an array of row objects.
    #[arg(short, long)]
    pub data: PathBuf,

    /// Tenant to scope the request to.
    #[arg(short, long)]
    pub tenant: Option<String>,

    /// JSON file describing the acting identity.
    #[arg(long)]
    pub actor: Option<PathBuf>,

    /// Skip policy enforcement.
    #[arg(long)]
    pub no_authorize: bool,

    /// Only expose public aggregates and attributes.
    #[arg(long)]
    pub public_only: bool,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// What to compute.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compute a standalone aggregate over a resource's rows.
    Aggregate {
        /// Root resource.
        resource: String,
        /// Aggregate kind: count, sum, min, max or avg.
        #[arg(value_parser = parse_kind)]
        kind: AggregateKind,
        /// Target field on the leaf resource.
        #[arg(long)]
        field: Option<String>,
        /// Relationship path such as `comments.likes`.
        #[arg(long)]
        path: Option<String>,
        /// Read action on the root resource.
        #[arg(long)]
        action: Option<String>,
        /// Print the plan instead of running it.
        #[arg(long)]
        explain: bool,
    },
    /// Load defined aggregates onto every row of a resource.
    Load {
        /// Root resource.
        resource: String,
        /// Aggregate names defined on the resource.
        #[arg(required = true)]
        aggregates: Vec<String>,
    },
}

fn parse_kind(raw: &str) -> Result<AggregateKind, String> {
    AggregateKind::from_name(&raw.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown aggregate kind '{raw}'"))
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Schema document path.
    pub schema_path: PathBuf,
    /// Dataset path.
    pub data_path: PathBuf,
    /// Actor document path.
    pub actor_path: Option<PathBuf>,
    /// Raw tenant, typed against the root resource's tenant attribute later.
    pub tenant: Option<String>,
    /// Whether policies are enforced.
    pub authorize: bool,
    /// Whether private aggregates and attributes are hidden.
    pub public_only: bool,
    /// Output format.
    pub format: OutputFormat,
    /// Command to run.
    pub command: Command,
}

impl Args {
    /// Convert command-line arguments to run configuration.
    pub fn into_config(self) -> CliConfig {
        CliConfig {
            schema_path: self.schema,
            data_path: self.data,
            actor_path: self.actor,
            tenant: self.tenant.filter(|t| !t.is_empty()),
            authorize: !self.no_authorize,
            public_only: self.public_only,
            format: self.format,
            command: self.command,
        }
    }
}

/// Split a dotted relationship path; an absent or empty path is the root itself.
pub fn split_path(path: Option<&str>) -> Vec<String> {
    path.map(|p| {
        p.split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aggregate_command() {
        let args = Args::try_parse_from([
            "relagg", "--schema", "s.json", "--data", "d.json", "--tenant", "foo", "aggregate",
            "Post", "avg", "--field", "score", "--path", "comments",
        ])
        .unwrap();
        let config = args.into_config();

        assert_eq!(config.tenant.as_deref(), Some("foo"));
        assert!(config.authorize);
        assert_eq!(config.format, OutputFormat::Table);
        assert_eq!(
            config.command,
            Command::Aggregate {
                resource: "Post".into(),
                kind: AggregateKind::Avg,
                field: Some("score".into()),
                path: Some("comments".into()),
                action: None,
                explain: false,
            }
        );
    }

    #[test]
    fn test_parse_load_command() {
        let args = Args::try_parse_from([
            "relagg", "-s", "s.json", "-d", "d.json", "--no-authorize", "--format", "json",
            "load", "Post", "count_of_comments", "max_score",
        ])
        .unwrap();
        let config = args.into_config();

        assert!(!config.authorize);
        assert_eq!(config.format, OutputFormat::Json);
        match config.command {
            Command::Load { resource, aggregates } => {
                assert_eq!(resource, "Post");
                assert_eq!(aggregates, vec!["count_of_comments", "max_score"]);
            }
            other => panic!("expected load, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let result = Args::try_parse_from([
            "relagg", "-s", "s.json", "-d", "d.json", "aggregate", "Post", "median",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_requires_names() {
        let result = Args::try_parse_from(["relagg", "-s", "s.json", "-d", "d.json", "load", "Post"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_tenant_is_unscoped() {
        let args = Args::try_parse_from([
            "relagg", "-s", "s.json", "-d", "d.json", "--tenant", "", "aggregate", "Post", "count",
        ])
        .unwrap();
        assert!(args.into_config().tenant.is_none());
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path(Some("comments.likes")), vec!["comments", "likes"]);
        assert_eq!(split_path(Some("comments")), vec!["comments"]);
        assert!(split_path(Some("")).is_empty());
        assert!(split_path(None).is_empty());
    }
}
