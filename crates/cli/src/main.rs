use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use arestor_core::configs::args::{DEFAULT_ARGUS_BRANCH, DEFAULT_TEMPEST_BRANCH, DEFAULT_USER};
use arestor_core::provisioner::{InstallAction, Provisioner, ProvisionerConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// arestor - Argus-CI environment provisioning
#[derive(Parser)]
#[command(name = "arestor")]
#[command(about = "Various tools for the Argus-CI framework")]
#[command(version)]
struct Cli {
    /// Settings file (YAML) overriding the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every executed command
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install Argus-CI resources on the current machine
    Install {
        #[command(subcommand)]
        action: InstallCommands,
    },
    /// Show the tasks an install action runs, in order
    Plan {
        /// Install action: "dependences" or "argus"
        #[arg(value_parser = parse_action)]
        action: InstallAction,
    },
}

#[derive(Subcommand)]
pub enum InstallCommands {
    /// Install the Argus-CI dependences on the current machine
    Dependences {
        #[command(flatten)]
        retry: RetryArgs,
    },
    /// Install the Argus-CI on the current machine
    Argus {
        /// Run the commands as specified user
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,

        /// The required branch / revision of the argus repository
        #[arg(long, env = "ARGUS_BRANCH", default_value = DEFAULT_ARGUS_BRANCH)]
        argus_branch: String,

        /// The required branch / revision of the tempest repository
        #[arg(long, env = "TEMPEST_BRANCH", default_value = DEFAULT_TEMPEST_BRANCH)]
        tempest_branch: String,

        /// The unique identifier for the current job
        #[arg(long)]
        build: String,

        /// Install into the system interpreter instead of a virtual environment
        #[arg(long)]
        no_venv: bool,

        #[command(flatten)]
        retry: RetryArgs,
    },
}

#[derive(clap::Args)]
pub struct RetryArgs {
    /// How many times a failing command is run (defaults to the settings value)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    attempts: Option<u32>,

    /// Seconds between two attempts of the same command
    #[arg(long)]
    retry_interval: Option<u64>,
}

fn parse_action(value: &str) -> Result<InstallAction, String> {
    value.parse().map_err(|e| format!("{}", e))
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("arestor_core=debug,arestor_cli=debug,info")
        } else {
            EnvFilter::new("arestor_core=info,arestor_cli=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let provisioner = Provisioner::new(ProvisionerConfig {
        settings_path: cli.config,
    })
    .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        Commands::Install { action } => commands::install::execute(&provisioner, action),
        Commands::Plan { action } => commands::plan::execute(&provisioner, action),
    }
}
