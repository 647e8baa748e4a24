//! relagg command-line client.
//!
//! Loads a JSON schema and dataset into the in-memory adapter and runs a
//! standalone aggregate or loads defined aggregates onto records.

mod commands;
mod config;
mod dataset;
mod error;
mod formatter;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Args;

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relagg=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Args::parse().into_config();
    tracing::debug!(
        schema = %config.schema_path.display(),
        data = %config.data_path.display(),
        tenant = ?config.tenant,
        authorize = config.authorize,
        "configuration loaded"
    );

    match commands::run(&config) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            let formatter = formatter::create_formatter(config.format);
            eprintln!("{}", formatter.format_error(&e.to_string()));
            std::process::exit(1);
        }
    }
}
