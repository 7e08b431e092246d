// server/src/cli/cli.rs

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lib::AppConfig;

use crate::cli::commands;

/// CLI entry point for medscript
#[derive(Parser, Debug)]
#[command(name = "medscript")]
#[command(version = "0.1.0")]
#[command(about = "Multi-tenant hospital prescription service")]
pub struct CliArgs {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true, env = "MEDSCRIPT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for medscript
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the HTTP server (the default)
    Serve {
        #[arg(short = 'p', long = "port", value_name = "PORT")]
        port: Option<u16>,
    },
    /// Load hospitals, their admins and doctors from a JSON file
    Seed {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the effective configuration with secrets redacted
    ShowConfig,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init in the same process is a no-op.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn start_cli() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = CliArgs::parse();
    let config = AppConfig::load(args.config.as_deref())?;

    match args.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve(config, port).await,
        Commands::Seed { file } => commands::seed(config, &file).await,
        Commands::ShowConfig => commands::show_config(&config),
    }
}
