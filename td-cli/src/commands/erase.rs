//! Account erase command.

use console::style;
use dialoguer::Confirm;

use td_core::config::ConfigHandle;
use td_core::error::TdResult;
use td_functions::eraser::{AuthContext, EraserService};
use td_functions::event_bus::EventBus;

use crate::OutputFormat;

pub async fn run(
    config: ConfigHandle,
    user_id: &str,
    yes: bool,
    format: OutputFormat,
) -> TdResult<()> {
    if !yes {
        println!(
            "  {} This will permanently delete ALL data for user {user_id}.",
            style("WARNING").red().bold()
        );

        let confirmed = Confirm::new()
            .with_prompt("  Are you sure you want to erase this account?")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmed {
            println!("  Erase cancelled.");
            return Ok(());
        }
    }

    let db = super::init_database(&config).await?;
    let blobs = super::init_blob_store(&config).await?;
    let eraser = EraserService::new(db, blobs, EventBus::new(16));

    let auth = AuthContext::new(user_id);
    match eraser.delete_user_data(Some(&auth)).await {
        Ok(summary) => {
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "success": true,
                            "user": user_id,
                            "documents_staged": summary.documents_staged,
                            "documents_removed": summary.documents_removed,
                            "objects_removed": summary.objects_removed,
                        })
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "  {} Erased account {user_id}.",
                        style("OK").green().bold()
                    );
                    println!("  Documents removed: {}", summary.documents_removed);
                    println!("  Objects removed:   {}", summary.objects_removed);
                }
            }
            Ok(())
        }
        Err(e) => {
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "success": false,
                            "code": e.code(),
                            "message": e.to_string(),
                        })
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "  {} [{}] {e}",
                        style("FAIL").red().bold(),
                        e.code()
                    );
                }
            }
            Err(e)
        }
    }
}
