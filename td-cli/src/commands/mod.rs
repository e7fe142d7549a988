//! CLI command implementations.

pub mod erase;
pub mod watch;
pub mod simulate;
pub mod db;

use std::sync::Arc;

use td_core::config::ConfigHandle;
use td_core::error::TdResult;
use td_functions::relay::RelayOutcome;
use td_push::{HttpPushGateway, PushGateway};
use td_store::{BlobStore, Database};

use crate::OutputFormat;

/// Helper to initialize the document store from config.
pub async fn init_database(config: &ConfigHandle) -> TdResult<Database> {
    let guard = config.read().await;
    let db_path = guard.effective_db_path()?;
    let db_config = guard.database.clone();
    drop(guard);
    Database::init(&db_path, &db_config)
}

/// Helper to open the blob store from config.
pub async fn init_blob_store(config: &ConfigHandle) -> TdResult<BlobStore> {
    let root = config.read().await.effective_storage_root()?;
    BlobStore::open(&root)
}

/// Helper to create a push gateway client from config.
pub async fn create_gateway(config: &ConfigHandle) -> TdResult<Arc<dyn PushGateway>> {
    let push_config = config.read().await.push.clone();
    Ok(Arc::new(HttpPushGateway::new(&push_config)?))
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Print relay outcomes in the requested format.
pub fn print_outcomes(outcomes: &[RelayOutcome], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = outcomes
                .iter()
                .map(|o| match o {
                    RelayOutcome::Sent { recipient } => {
                        serde_json::json!({"outcome": "sent", "recipient": recipient})
                    }
                    RelayOutcome::Skipped { reason } => {
                        serde_json::json!({"outcome": "skipped", "reason": reason})
                    }
                    RelayOutcome::Failed { recipient, error } => {
                        serde_json::json!({"outcome": "failed", "recipient": recipient, "error": error})
                    }
                })
                .collect();
            println!("{}", serde_json::json!({ "outcomes": entries }));
        }
        OutputFormat::Text => {
            if outcomes.is_empty() {
                println!("  No notification attempts.");
                return;
            }
            for outcome in outcomes {
                match outcome {
                    RelayOutcome::Sent { recipient } => {
                        println!(
                            "  {} sent to {recipient}",
                            console::style("OK").green().bold()
                        );
                    }
                    RelayOutcome::Skipped { reason } => {
                        println!("  {} {reason}", console::style("SKIP").yellow().bold());
                    }
                    RelayOutcome::Failed { recipient, error } => {
                        println!(
                            "  {} {recipient}: {error}",
                            console::style("FAIL").red().bold()
                        );
                    }
                }
            }
        }
    }
}
