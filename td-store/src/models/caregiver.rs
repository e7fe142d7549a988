//! Caregiver relationship document model.

use serde_json::Value;

use super::profile::str_field;

/// A caregiver relationship linking a patient to a caregiver account.
#[derive(Debug, Clone, Default)]
pub struct CaregiverLink {
    /// The patient this relationship belongs to.
    pub user_id: Option<String>,
    /// The caregiver's user account, once they have one.
    pub caregiver_user_id: Option<String>,
    /// Whether the caregiver wants missed-dose notifications.
    pub notify_on_missed: bool,
}

impl CaregiverLink {
    /// Parse a relationship from a document body.
    pub fn from_fields(fields: &Value) -> Self {
        Self {
            user_id: str_field(fields, "userId"),
            caregiver_user_id: str_field(fields, "caregiverUserId"),
            notify_on_missed: fields
                .get("notifyOnMissed")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }
}
