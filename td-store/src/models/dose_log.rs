//! Dose log document model.

use serde_json::Value;
use td_core::constants::log_status;

use super::profile::str_field;

/// A dose log entry recorded under a user's `logs` collection.
#[derive(Debug, Clone, Default)]
pub struct DoseLog {
    /// Log status: "taken", "missed", "skipped".
    pub status: Option<String>,
    /// Reference to the medicine this dose belongs to.
    pub medicine_id: Option<String>,
}

impl DoseLog {
    /// Parse a log entry from a document body.
    pub fn from_fields(fields: &Value) -> Self {
        Self {
            status: str_field(fields, "status"),
            medicine_id: str_field(fields, "medicineId"),
        }
    }

    /// Whether this log records a missed dose.
    pub fn is_missed(&self) -> bool {
        self.status.as_deref() == Some(log_status::MISSED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missed() {
        let log = DoseLog::from_fields(&json!({"status": "missed", "medicineId": "m1"}));
        assert!(log.is_missed());
        assert_eq!(log.medicine_id.as_deref(), Some("m1"));
    }

    #[test]
    fn test_other_statuses_not_missed() {
        assert!(!DoseLog::from_fields(&json!({"status": "taken"})).is_missed());
        assert!(!DoseLog::from_fields(&json!({"status": "skipped"})).is_missed());
        assert!(!DoseLog::from_fields(&json!({})).is_missed());
    }
}
