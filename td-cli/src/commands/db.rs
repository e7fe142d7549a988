//! Document store management commands.

use clap::Subcommand;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use td_core::config::ConfigHandle;
use td_core::error::TdResult;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show document store statistics.
    Stats,
    /// Run an integrity check.
    Check,
    /// Reset the store (WARNING: destroys all data).
    Reset,
    /// Show the database file path.
    Path,
}

pub async fn run(config: ConfigHandle, action: DbAction, format: OutputFormat) -> TdResult<()> {
    let db_path = config.read().await.effective_db_path()?;

    match action {
        DbAction::Stats => {
            let db = super::init_database(&config).await?;
            let stats = db.stats()?;

            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());
            let wal_path = db_path.with_extension("db-wal");
            let wal_size = std::fs::metadata(&wal_path).ok().map(|m| m.len());

            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({
                        "path": db_path.display().to_string(),
                        "collections": {
                            "users": stats.users,
                            "medicines": stats.medicines,
                            "reminders": stats.reminders,
                            "logs": stats.logs,
                            "side_effects": stats.side_effects,
                            "conversations": stats.conversations,
                            "messages": stats.messages,
                            "caregivers": stats.caregivers,
                            "invitations": stats.invitations,
                        },
                        "total_documents": stats.total(),
                        "file_size_bytes": file_size,
                        "wal_size_bytes": wal_size,
                        "journal_mode": journal_mode,
                    }));
                }
                OutputFormat::Text => {
                    println!("{}", style("Document Store Statistics").bold().underlined());
                    println!("  Path:          {}", db_path.display());
                    println!("  Journal mode:  {}", journal_mode);
                    println!();

                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL)
                        .apply_modifier(UTF8_ROUND_CORNERS)
                        .set_content_arrangement(ContentArrangement::Dynamic);

                    table.set_header(vec!["Collection", "Documents"]);
                    table.add_row(vec!["users".to_string(), stats.users.to_string()]);
                    table.add_row(vec!["medicines".to_string(), stats.medicines.to_string()]);
                    table.add_row(vec!["reminders".to_string(), stats.reminders.to_string()]);
                    table.add_row(vec!["logs".to_string(), stats.logs.to_string()]);
                    table.add_row(vec!["side_effects".to_string(), stats.side_effects.to_string()]);
                    table.add_row(vec!["conversations".to_string(), stats.conversations.to_string()]);
                    table.add_row(vec!["messages".to_string(), stats.messages.to_string()]);
                    table.add_row(vec!["caregivers".to_string(), stats.caregivers.to_string()]);
                    table.add_row(vec!["invitations".to_string(), stats.invitations.to_string()]);

                    println!("{table}");

                    println!();
                    println!("{}", style("Storage").bold().underlined());
                    if let Some(size) = file_size {
                        println!("  Database:      {}", super::format_bytes(size));
                    }
                    if let Some(size) = wal_size {
                        println!("  WAL file:      {}", super::format_bytes(size));
                    }
                    println!("  Documents:     {}", stats.total());
                }
            }
        }
        DbAction::Check => {
            println!("  {} Running integrity check...", style("...").dim());
            let db = super::init_database(&config).await?;

            let conn = db.conn()?;
            let quick_result: String = conn
                .query_row("PRAGMA quick_check", [], |row| row.get(0))
                .unwrap_or_else(|_| "error".to_string());

            if quick_result == "ok" {
                println!("  {} Quick check passed.", style("OK").green().bold());
            } else {
                println!(
                    "  {} Quick check issue: {}",
                    style("WARN").yellow().bold(),
                    quick_result
                );
            }

            match db.run_integrity_check() {
                Ok(()) => {
                    println!(
                        "  {} Full integrity check passed.",
                        style("OK").green().bold()
                    );
                }
                Err(e) => {
                    println!(
                        "  {} Integrity check failed: {}",
                        style("FAIL").red().bold(),
                        e
                    );
                }
            }
        }
        DbAction::Reset => {
            println!(
                "  {} This will delete ALL documents in the store.",
                style("WARNING").red().bold()
            );
            println!("  Database: {}", db_path.display());

            let confirmed = Confirm::new()
                .with_prompt("  Are you sure you want to reset the store?")
                .default(false)
                .interact()
                .unwrap_or(false);

            if !confirmed {
                println!("  Reset cancelled.");
                return Ok(());
            }

            let db = super::init_database(&config).await?;
            db.reset()?;
            println!("  {} Store reset complete.", style("OK").green().bold());
        }
        DbAction::Path => {
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({"path": db_path.display().to_string()}));
                }
                OutputFormat::Text => {
                    println!("{}", db_path.display());
                }
            }
        }
    }

    Ok(())
}
