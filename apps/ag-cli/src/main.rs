//! # ag-cli
//!
//! Command-line front end for the AgentGate security gate.
//!
//! - `ag validate`: statically check generated agent source files
//! - `ag evaluate`: decide whether one capability invocation may run
//! - `ag classify`: tier a capability set and flag risky combinations
//! - `ag policy`: show the policy a capability resolves to
//! - `ag summary`: the generation-time security summary

mod commands;
mod config;

use std::path::PathBuf;

use ag_policy::SecurityLevel;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::GateConfig;

/// AgentGate: security gate for generated agents.
#[derive(Parser)]
#[command(name = "ag", version, about)]
struct Cli {
    /// Gate configuration file (defaults to ./agentgate.yaml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Security level (low, medium, high, maximum). Overrides the config file.
    #[arg(long, global = true)]
    level: Option<SecurityLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate generated source files.
    Validate {
        /// Files to validate.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print results as JSON instead of a report.
        #[arg(long)]
        json: bool,
    },
    /// Evaluate one capability invocation.
    Evaluate {
        /// Capability name (e.g. read_file).
        capability: String,
        /// Invocation parameters as a JSON object.
        #[arg(long)]
        params: Option<String>,
        /// Print every check performed, not just the decision.
        #[arg(long)]
        trace: bool,
    },
    /// Classify the risk of a capability set.
    Classify {
        #[arg(required = true)]
        capabilities: Vec<String>,
    },
    /// Show the resolved policy for a capability.
    Policy { capability: String },
    /// Build the security summary for a capability set.
    Summary {
        #[arg(required = true)]
        capabilities: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ag_policy=info".parse()?)
                .add_directive("ag_validator=info".parse()?)
                .add_directive("ag=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = GateConfig::load(cli.config.as_deref())?;
    let level = cli.level.or(config.security_level).unwrap_or_default();
    tracing::debug!("Security level: {}", level);

    match &cli.command {
        Commands::Validate { files, json } => commands::validate::execute(files, *json, &config),
        Commands::Evaluate {
            capability,
            params,
            trace,
        } => commands::evaluate::execute(capability, params.as_deref(), *trace, &config, level),
        Commands::Classify { capabilities } => commands::classify::execute(capabilities, level),
        Commands::Policy { capability } => commands::policy::execute(capability, &config),
        Commands::Summary { capabilities } => {
            commands::summary::execute(capabilities, &config, level)
        }
    }
}
