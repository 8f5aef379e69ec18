//! Tollgate - authenticating OAuth2 reverse proxy
//!
//! Main entry point for the tollgate CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, keygen, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Tollgate - authenticating OAuth2 reverse proxy
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write JSON logs to a daily-rotated file in this directory
    #[arg(long, global = true, env = "TOLLGATE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Start(start::StartArgs),

    /// Generate a random cookie key and IV
    Keygen(keygen::KeygenArgs),

    /// Show the resolved configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + optional rotating JSON file
    let filter = if cli.verbose {
        "tollgate=debug,tollgate_server=debug,tollgate_config=debug,tower_http=debug,info"
    } else {
        "tollgate=info,tollgate_server=info,tollgate_config=info,warn"
    };

    let (file_layer, _guard) = match cli.log_dir.as_deref() {
        Some(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "tollgate.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "tollgate=trace,tollgate_server=trace,tollgate_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
                ),
        )
        .with(file_layer)
        .init();

    let ctx = commands::Context {
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Keygen(args) => keygen::run(args, &ctx),
        Commands::Config(args) => config::run(args, &ctx),
    }
}
