//! Artifact Registry Command Line Interface
//!
//! Query artifacts, workspaces and model lineage from an ML Metadata store.
//!
//! # Usage
//!
//! ```bash
//! # Artifacts by id
//! artifact-registry get --id 9474 --id 9475
//!
//! # Workspaces and their artifacts
//! artifact-registry workspaces
//! artifact-registry artifacts --workspace ws-mnist
//! artifact-registry by-type --workspace ws-mnist --kind model
//! artifact-registry by-run --workspace ws-mnist --run 3f2a...
//!
//! # Lineage of a model
//! artifact-registry lineage --workspace ws-mnist --model-id 9474 -o json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use artifact_registry::{
    logging, ArtifactKind, ArtifactRecord, ArtifactStore, Lineage, RegistryConfig,
    WorkspaceRecord,
};

#[derive(Parser)]
#[command(name = "artifact-registry")]
#[command(version)]
#[command(about = "Query artifacts and lineage from an ML Metadata store")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// YAML config file (host, port, timeout_ms, connect_timeout_ms)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Metadata store host (overrides config and MLMD_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Metadata store port (overrides config and MLMD_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Caller identifier attached to log lines
    #[arg(long, global = true, env = "MLMD_CLIENT_UUID", default_value = "artifact-registry-cli")]
    uuid: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch artifacts by id
    Get {
        /// Artifact id (repeatable)
        #[arg(long = "id", required = true)]
        ids: Vec<i64>,
    },

    /// List workspaces
    Workspaces,

    /// List every artifact in a workspace
    Artifacts {
        #[arg(short, long)]
        workspace: String,
    },

    /// List workspace artifacts of one kind
    ByType {
        #[arg(short, long)]
        workspace: String,

        /// dataset, model or metrics
        #[arg(short, long, value_parser = parse_queryable_kind)]
        kind: ArtifactKind,
    },

    /// List workspace artifacts produced by a run
    ByRun {
        #[arg(short, long)]
        workspace: String,

        #[arg(short, long)]
        run: String,
    },

    /// Show the lineage of a model
    Lineage {
        #[arg(short, long)]
        workspace: String,

        #[arg(short, long)]
        model_id: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let store = ArtifactStore::connect(cli.uuid.clone(), &config)
        .await
        .with_context(|| format!("connecting to {}", config.endpoint()))?;

    match cli.command {
        Commands::Get { ids } => {
            let artifacts = store.artifacts_by_id(&ids).await?;
            emit(cli.format, &artifacts[..], print_artifacts)
        }
        Commands::Workspaces => {
            let workspaces = store.workspaces().await?;
            emit(cli.format, &workspaces[..], print_workspaces)
        }
        Commands::Artifacts { workspace } => {
            let artifacts = store.workspace(&workspace).await?.artifacts().await?;
            emit(cli.format, &artifacts[..], print_artifacts)
        }
        Commands::ByType { workspace, kind } => {
            let artifacts = store
                .workspace(&workspace)
                .await?
                .artifacts_by_type(kind)
                .await?;
            emit(cli.format, &artifacts[..], print_artifacts)
        }
        Commands::ByRun { workspace, run } => {
            let artifacts = store
                .workspace(&workspace)
                .await?
                .artifacts_by_run(&run)
                .await?;
            emit(cli.format, &artifacts[..], print_artifacts)
        }
        Commands::Lineage {
            workspace,
            model_id,
        } => {
            let lineage = store
                .workspace(&workspace)
                .await?
                .lineage_by_model(model_id)
                .await?;
            emit(cli.format, &lineage, print_lineage)
        }
    }
}

/// Kinds with an MLMD type name; `other` cannot be queried by type.
fn parse_queryable_kind(raw: &str) -> Result<ArtifactKind, String> {
    let kind: ArtifactKind = raw.parse()?;
    if kind.type_name().is_none() {
        return Err(format!(
            "'{}' cannot be queried by type (expected dataset, model or metrics)",
            raw
        ));
    }
    Ok(kind)
}

fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::from_file(path)?,
        None => RegistryConfig::from_env()?,
    };
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    Ok(config)
}

fn emit<T: Serialize + ?Sized>(format: OutputFormat, value: &T, pretty: fn(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Pretty => pretty(value),
    }
    Ok(())
}

fn print_artifacts(artifacts: &[ArtifactRecord]) {
    if artifacts.is_empty() {
        println!("{}", "No artifacts".dimmed());
        return;
    }
    for a in artifacts {
        println!(
            "{:>8}  {:<8}  {}  {}",
            a.id.to_string().cyan(),
            a.kind.to_string().yellow(),
            a.name.bold(),
            a.version.dimmed()
        );
        println!("          uri: {}", a.uri);
        if !a.run_id.is_empty() {
            println!("          run: {}", a.run_id);
        }
    }
}

fn print_workspaces(workspaces: &[WorkspaceRecord]) {
    if workspaces.is_empty() {
        println!("{}", "No workspaces".dimmed());
        return;
    }
    for w in workspaces {
        println!("{:>8}  {}", w.id.to_string().cyan(), w.name.bold());
    }
}

fn print_lineage(lineage: &Lineage) {
    println!("{} {}", "Lineage of model".bold(), lineage.model_id);
    if lineage.execution_ids.is_empty() {
        println!("{}", "  No executions recorded".dimmed());
        return;
    }
    for &execution_id in &lineage.execution_ids {
        println!("  {} {}", "execution".green(), execution_id);
        for a in lineage.inputs_of(execution_id) {
            println!("    {} {} ({}, {})", "<-".blue(), a.name, a.kind, a.id);
        }
        for a in lineage.outputs_of(execution_id) {
            println!("    {} {} ({}, {})", "->".magenta(), a.name, a.kind, a.id);
        }
    }
}
