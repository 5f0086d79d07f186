//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mtray_core::TrayConfig;
use mtray_core::config::paths;

mod commands;

#[derive(Parser)]
#[command(name = "mtray")]
#[command(version = "0.1")]
#[command(about = "Message tray engine driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable animations (apply every transition's end state immediately)
    #[arg(long, global = true)]
    no_animations: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a built-in scripted scenario and print list snapshots
    Demo,
    /// Replay a scenario file against the engine
    Replay {
        /// Path to the scenario JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the drained signals after every step
        #[arg(long)]
        signals: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = TrayConfig::load().context("load config")?;
    if cli.no_animations {
        config.animations = false;
    }

    match cli.command {
        Commands::Demo => commands::demo::run(config),
        Commands::Replay { file, signals } => commands::replay::run(config, &file, signals),
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(&paths::config_path()),
        },
    }
}
