//! User profile document model.

use serde_json::Value;

/// A user's root profile document.
///
/// Only the fields the backend reads are modeled; everything else in the
/// profile body is owned by the mobile app.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub fcm_token: Option<String>,
}

impl UserProfile {
    /// Parse a profile from a document body.
    pub fn from_fields(fields: &Value) -> Self {
        Self {
            display_name: str_field(fields, "displayName"),
            email: str_field(fields, "email"),
            fcm_token: str_field(fields, "fcmToken"),
        }
    }

    /// Display name, falling back to `default` when absent or blank.
    pub fn display_name_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => default,
        }
    }

    /// Whether this profile can receive push notifications.
    pub fn has_token(&self) -> bool {
        self.fcm_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Extract a non-null string field from a JSON body.
pub(crate) fn str_field(fields: &Value, name: &str) -> Option<String> {
    fields.get(name).and_then(|v| v.as_str()).map(String::from)
}
