//! Relaybot CLI — entry point.
//!
//! # Commands
//!
//! - `relaybot run` — start all configured accounts (plus liveness endpoint)
//! - `relaybot status` — show configuration and backend status
//! - `relaybot history -u USER` — inspect a user's stored conversation

mod history_cmd;
mod liveness;
mod run;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Relaybot — AI conversation relay for your messaging accounts
#[derive(Parser)]
#[command(name = "relaybot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay: all configured accounts + liveness endpoint
    Run {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,

        /// Use an in-memory history store (nothing persisted)
        #[arg(long, default_value_t = false)]
        ephemeral: bool,
    },

    /// Show configuration and backend status
    Status,

    /// Show a user's stored conversation turns
    History {
        /// User identifier
        #[arg(short, long)]
        user: String,

        /// Maximum number of turns to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { logs, ephemeral } => {
            init_logging(logs);
            run::run(ephemeral).await
        }
        Commands::Status => status::run(),
        Commands::History { user, limit } => history_cmd::run(&user, limit),
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("relaybot=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
