use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "caravan")]
#[command(version, about = "Sticky group-formation orchestrator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Directory holding caravan.toml. Defaults to the current directory.
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scripted scenario through a formation
    Simulate {
        /// Path to the scenario TOML file
        scenario: PathBuf,

        /// Stop after this many game ticks
        #[arg(long, default_value = "10000")]
        max_ticks: u64,

        /// Save the formation state here when the run stops
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Resume from a snapshot written by --snapshot
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Complete animal gathering on its first check
        #[arg(long)]
        fast_animals: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the grafted phase graph for a scenario
    Graph {
        /// Path to the scenario TOML file
        scenario: PathBuf,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default caravan.toml file
    Init,
}

fn init_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Simulate {
            scenario,
            max_ticks,
            snapshot,
            resume,
            fast_animals,
            json,
        } => cmd::cmd_simulate(
            &project_dir,
            scenario,
            cmd::SimulateOptions {
                max_ticks: *max_ticks,
                snapshot: snapshot.as_deref(),
                resume: resume.as_deref(),
                fast_animals: *fast_animals,
                json: *json,
            },
        )?,
        Commands::Graph { scenario } => cmd::cmd_graph(&project_dir, scenario)?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
