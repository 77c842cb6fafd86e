use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cql_provisioner::config::load_config;
use cql_provisioner::manifest::Manifest;
use cql_provisioner::{Drift, ResourceKind, ResourceRegistry};
use svckit::database::DatabaseFactory;
use svckit::metrics;

#[derive(Parser, Debug)]
#[command(name = "cql-provisioner")]
#[command(about = "Reconcile keyspaces, roles and grants against a Cassandra/ScyllaDB cluster")]
struct Args {
    #[arg(short, long, default_value = "config/cql-provisioner.yaml")]
    config: String,

    /// Write reconcile metrics in the Prometheus text format here on exit
    #[arg(long)]
    metrics_file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update every resource in the manifest
    Apply {
        #[arg(short, long, default_value = "config/manifest.yaml")]
        manifest: String,
    },
    /// Report drift between the manifest and the cluster
    Plan {
        #[arg(short, long, default_value = "config/manifest.yaml")]
        manifest: String,
    },
    /// Delete every resource in the manifest, grants first
    Destroy {
        #[arg(short, long, default_value = "config/manifest.yaml")]
        manifest: String,
    },
    /// Print the live definition of an existing keyspace or role
    Import { kind: String, key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cql_provisioner={0},svckit={0}", config.observability.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let session = DatabaseFactory::create_from_config(&config.database).await?;
    let registry = ResourceRegistry::new(session, config.schema.clone());

    let outcome = run(&registry, args.command).await;

    if let Some(path) = args.metrics_file {
        let text = metrics::gather_text()?;
        std::fs::write(&path, text)?;
        info!("Metrics written to {}", path);
    }

    outcome
}

async fn run(registry: &ResourceRegistry, command: Command) -> Result<()> {
    match command {
        Command::Apply { manifest } => {
            let resources = Manifest::load(&manifest)?.resources()?;
            for resource in &resources {
                let reconciled = registry.apply(resource).await?;
                info!("{} {} reconciled", resource.kind(), reconciled.key);
            }
            info!("Applied {} resources", resources.len());
        }
        Command::Plan { manifest } => {
            let resources = Manifest::load(&manifest)?.resources()?;
            let mut pending = 0;
            for resource in &resources {
                match registry.diff(resource).await? {
                    Drift::InSync => info!("{} {} in sync", resource.kind(), resource.key()),
                    Drift::Missing => {
                        pending += 1;
                        warn!("{} {} missing", resource.kind(), resource.key());
                    }
                    Drift::Drifted { live } => {
                        pending += 1;
                        warn!("{} {} drifted: live {:?}", resource.kind(), resource.key(), live);
                    }
                }
            }
            info!("{} of {} resources need changes", pending, resources.len());
        }
        Command::Destroy { manifest } => {
            let resources = Manifest::load(&manifest)?.resources()?;
            for resource in resources.iter().rev() {
                registry.delete(resource).await?;
                info!("{} {} deleted", resource.kind(), resource.key());
            }
        }
        Command::Import { kind, key } => {
            let kind: ResourceKind = kind.parse()?;
            match registry.import(kind, &key).await {
                Ok(reconciled) => println!("{:#?}", reconciled.observed),
                Err(e) => {
                    error!("Import of {} {} failed: {}", kind, key, e);
                    bail!(e);
                }
            }
        }
    }

    Ok(())
}
