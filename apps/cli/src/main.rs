//! Aeris CLI - manual trigger surface for the training pipeline
//!
//! Provides the `aeris` command: `aeris run` executes one train-then-notify
//! pipeline run; `aeris check` validates configuration and store access
//! without training.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Aeris - air-quality model training pipeline
#[derive(Parser, Debug)]
#[command(
    name = "aeris",
    author,
    version,
    about = "Aeris - train and publish the air-quality regression model",
    long_about = "Trains the PM2.5 regression model on the feature-engineered dataset in \
                  object storage, persists the winning model, and notifies the operator.\n\
                  Configuration comes from AERIS_* environment variables."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trigger one pipeline run
    ///
    /// Runs training (with its retry budget) and, on success, sends the
    /// completion notification. Exit code 0 on success; 2 for data/schema
    /// problems, 3 for storage I/O, 4 for access/credentials, 5 if cancelled.
    Run {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and storage access without training
    Check,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = args.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let code = match args.command {
        Command::Run { json } => commands::run::execute(json).await,
        Command::Check => commands::check::execute(),
    };
    std::process::exit(code);
}
