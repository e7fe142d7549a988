//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "Tickdose";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database schema version.
pub const DB_SCHEMA_VERSION: i32 = 1;

/// Default push gateway request timeout in milliseconds.
pub const DEFAULT_PUSH_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval for the document watcher in milliseconds.
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 1_000;

/// Base URL for caregiver invitation deep links.
pub const INVITE_URL_BASE: &str = "https://tickdose.app/invite";

/// Collection names in the document store.
pub mod collections {
    /// Root user profile documents.
    pub const USERS: &str = "users";
    /// Conversation documents, keyed independently with a `userId` owner.
    pub const CONVERSATIONS: &str = "iFeelConversations";
    /// Message subcollection under each conversation.
    pub const MESSAGES: &str = "messages";
    /// Caregiver relationship documents.
    pub const CAREGIVERS: &str = "caregivers";
    /// Caregiver invitation documents.
    pub const CAREGIVER_INVITATIONS: &str = "caregiver_invitations";

    /// Owned-data collections nested under each user, in erasure order.
    pub const USER_OWNED: &[&str] = &["medicines", "reminders", "logs", "side_effects"];

    /// Medicine records under a user.
    pub const MEDICINES: &str = "medicines";
    /// Dose log records under a user.
    pub const LOGS: &str = "logs";
}

/// Per-user blob storage prefixes, used only for bulk prefix deletion.
pub mod storage_prefixes {
    /// All prefix templates; `{}` is replaced with the user id.
    pub const ALL: &[&str] = &["users", "voice", "voice_messages"];

    /// Build the object prefix for a user under the given root segment.
    pub fn for_user(root: &str, user_id: &str) -> String {
        format!("{root}/{user_id}/")
    }
}

/// Push notification channel identifiers understood by the mobile app.
pub mod channels {
    /// Channel for caregiver invitation notifications.
    pub const CAREGIVER_INVITATIONS: &str = "caregiver_invitations";
    /// Channel for caregiver assignment and missed-dose notifications.
    pub const CAREGIVER_NOTIFICATIONS: &str = "caregiver_notifications";
}

/// Click action the Flutter shell expects on tap.
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// Dose log status values.
pub mod log_status {
    pub const TAKEN: &str = "taken";
    pub const MISSED: &str = "missed";
    pub const SKIPPED: &str = "skipped";
}

/// Fallback display names when a profile or field is absent.
pub mod fallback_names {
    /// Inviter/assigner shown to a caregiver.
    pub const SOMEONE: &str = "Someone";
    /// Patient shown in missed-dose notifications.
    pub const PATIENT: &str = "Patient";
    /// Medicine name when the referenced document is missing.
    pub const MEDICINE: &str = "medicine";
}
