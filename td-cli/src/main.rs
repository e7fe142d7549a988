//! Tickdose CLI - Operate the medication-reminder backend from the terminal.
//!
//! Provides the account-erase callable, a local trigger watcher, document
//! simulation for exercising the notification relay, and store maintenance.

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use td_core::config::{AppConfig, ConfigHandle};
use td_core::error::TdResult;
use td_core::logging;
use td_core::platform::Platform;

/// Tickdose backend - account erasure and caregiver notification relay.
#[derive(Parser)]
#[command(
    name = "tickdose",
    version,
    about = "Tickdose backend CLI",
    long_about = "Command-line interface for the Tickdose backend.\n\
                   Erase user accounts, watch the document store for trigger events,\n\
                   and simulate documents to exercise the notification relay."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Erase all data owned by a user (irreversible).
    Erase {
        /// User id whose data will be erased.
        #[arg(short, long)]
        user: String,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Watch the document store and route new documents to trigger handlers.
    Watch {
        /// Polling interval in milliseconds.
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
    /// Write a sample document and run its trigger handler.
    Simulate {
        #[command(subcommand)]
        action: commands::simulate::SimulateAction,
    },
    /// Document store management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
}

#[tokio::main]
async fn main() -> TdResult<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let log_dir = Platform::data_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("logs");
    let _guard = logging::init_logging(log_level, &log_dir, false)?;

    // Load configuration
    let config_path = cli.config.as_deref().map(std::path::Path::new);
    let config = if let Some(path) = config_path {
        AppConfig::load_from_file(path)?
    } else {
        AppConfig::load_default()?
    };

    let config_handle = ConfigHandle::new(config);

    info!("Tickdose backend CLI v{}", td_core::constants::APP_VERSION);

    // Dispatch to command handlers
    match cli.command {
        Commands::Erase { user, yes } => {
            commands::erase::run(config_handle, &user, yes, cli.format).await
        }
        Commands::Watch { interval_ms } => {
            commands::watch::run(config_handle, interval_ms).await
        }
        Commands::Simulate { action } => {
            commands::simulate::run(config_handle, action, cli.format).await
        }
        Commands::Db { action } => {
            commands::db::run(config_handle, action, cli.format).await
        }
    }
}
