//! Simulate command: write a sample document and run its trigger handler.
//!
//! Useful for exercising the notification relay end-to-end against the
//! configured gateway without the mobile app in the loop.

use std::sync::Arc;

use clap::Subcommand;
use console::style;
use serde_json::json;
use uuid::Uuid;

use td_core::config::ConfigHandle;
use td_core::error::TdResult;
use td_functions::relay::RelayService;
use td_functions::router::TriggerRouter;
use td_store::paths::DocPath;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum SimulateAction {
    /// Create a caregiver invitation document.
    Invitation {
        /// Inviting user id.
        #[arg(short, long)]
        user: String,
        /// Invitee's email address.
        #[arg(short, long)]
        email: String,
        /// Invitation token (generated when omitted).
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Create a caregiver relationship document.
    Assignment {
        /// Patient user id.
        #[arg(short, long)]
        user: String,
        /// Caregiver user id.
        #[arg(short = 'g', long)]
        caregiver: String,
        /// Enable missed-dose notifications for this caregiver.
        #[arg(long)]
        notify: bool,
    },
    /// Create a missed-dose log entry under a user.
    MissedDose {
        /// Patient user id.
        #[arg(short, long)]
        user: String,
        /// Medicine document id referenced by the log.
        #[arg(short, long)]
        medicine: Option<String>,
    },
}

pub async fn run(config: ConfigHandle, action: SimulateAction, format: OutputFormat) -> TdResult<()> {
    let db = super::init_database(&config).await?;
    let gateway = super::create_gateway(&config).await?;
    let invite_url_base = config.read().await.relay.invite_url_base.clone();

    let relay = RelayService::new(db.clone(), gateway, &invite_url_base);
    let router = TriggerRouter::new(Arc::new(relay));

    let doc_id = Uuid::new_v4().to_string();
    let (path, fields) = match action {
        SimulateAction::Invitation { user, email, token } => {
            let token = token.unwrap_or_else(|| Uuid::new_v4().to_string());
            (
                format!("caregiver_invitations/{doc_id}"),
                json!({"userId": user, "caregiverEmail": email, "token": token}),
            )
        }
        SimulateAction::Assignment {
            user,
            caregiver,
            notify,
        } => (
            format!("caregivers/{doc_id}"),
            json!({"userId": user, "caregiverUserId": caregiver, "notifyOnMissed": notify}),
        ),
        SimulateAction::MissedDose { user, medicine } => {
            let mut fields = json!({"status": "missed"});
            if let Some(medicine) = medicine {
                fields["medicineId"] = json!(medicine);
            }
            (format!("users/{user}/logs/{doc_id}"), fields)
        }
    };

    let doc_path = DocPath::parse(&path)?;
    db.put_document(&doc_path, &fields)?;

    if matches!(format, OutputFormat::Text) {
        println!("  {} Created {path}", style("OK").green().bold());
    }

    let outcomes = router.handle_created(&path, &fields).await;
    super::print_outcomes(&outcomes, format);

    Ok(())
}
