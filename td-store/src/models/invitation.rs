//! Caregiver invitation document model.

use serde_json::Value;

use super::profile::str_field;

/// An invitation from a patient to a prospective caregiver, addressed by
/// email and carrying a one-time token.
#[derive(Debug, Clone, Default)]
pub struct CaregiverInvitation {
    /// The inviting patient's user id.
    pub user_id: Option<String>,
    /// The invitee's contact address.
    pub caregiver_email: Option<String>,
    /// One-time invitation token embedded in the deep link.
    pub token: Option<String>,
}

impl CaregiverInvitation {
    /// Parse an invitation from a document body.
    pub fn from_fields(fields: &Value) -> Self {
        Self {
            user_id: str_field(fields, "userId"),
            caregiver_email: str_field(fields, "caregiverEmail"),
            token: str_field(fields, "token"),
        }
    }

    /// Whether the invitation carries both an address and a token.
    pub fn is_deliverable(&self) -> bool {
        self.caregiver_email.as_deref().is_some_and(|e| !e.is_empty())
            && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
