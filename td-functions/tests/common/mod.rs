//! Shared test utilities for integration tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use td_core::config::DatabaseConfig;
use td_core::error::{TdError, TdResult};
use td_functions::event_bus::EventBus;
use td_push::{PushGateway, PushMessage};
use td_store::paths::DocPath;
use td_store::{BlobStore, Database};

/// Create a temporary database with full schema and migrations applied,
/// plus a blob store rooted in the same directory.
/// Returns the TempDir last; it must be held alive for the test duration.
pub fn create_test_env() -> (Database, BlobStore, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = Database::init(&dir.path().join("test.db"), &DatabaseConfig::default())
        .expect("failed to init test database");
    let blobs = BlobStore::open(&dir.path().join("storage")).expect("failed to open blob store");
    (db, blobs, dir)
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

/// Write a document at `path`.
pub fn put_doc(db: &Database, path: &str, fields: Value) {
    let path = DocPath::parse(path).expect("invalid test path");
    db.put_document(&path, &fields).expect("failed to put document");
}

/// Seed a user profile document.
pub fn seed_user(db: &Database, user_id: &str, display_name: &str, email: &str, token: Option<&str>) {
    let mut fields = json!({
        "displayName": display_name,
        "email": email,
    });
    if let Some(token) = token {
        fields["fcmToken"] = json!(token);
    }
    put_doc(db, &format!("users/{user_id}"), fields);
}

/// Seed a full set of owned data for a user:
/// 3 medicines, 2 reminders, 4 logs, 1 side effect, 2 conversations
/// (the first with 3 messages), 2 caregiver links, and 1 invitation.
///
/// Returns the number of documents seeded including the profile.
pub fn seed_user_data(db: &Database, user_id: &str) -> usize {
    seed_user(db, user_id, "Test User", &format!("{user_id}@example.com"), None);
    let mut count = 1;

    for i in 1..=3 {
        put_doc(
            db,
            &format!("users/{user_id}/medicines/{user_id}-m{i}"),
            json!({"name": format!("Medicine {i}")}),
        );
        count += 1;
    }
    for i in 1..=2 {
        put_doc(
            db,
            &format!("users/{user_id}/reminders/{user_id}-r{i}"),
            json!({"hour": 8 + i}),
        );
        count += 1;
    }
    for i in 1..=4 {
        put_doc(
            db,
            &format!("users/{user_id}/logs/{user_id}-l{i}"),
            json!({"status": if i % 2 == 0 { "taken" } else { "missed" }}),
        );
        count += 1;
    }
    put_doc(
        db,
        &format!("users/{user_id}/side_effects/{user_id}-s1"),
        json!({"note": "headache"}),
    );
    count += 1;

    for i in 1..=2 {
        let conv = format!("{user_id}-c{i}");
        put_doc(
            db,
            &format!("iFeelConversations/{conv}"),
            json!({"userId": user_id}),
        );
        count += 1;
        if i == 1 {
            for m in 1..=3 {
                put_doc(
                    db,
                    &format!("iFeelConversations/{conv}/messages/{conv}-m{m}"),
                    json!({"text": format!("message {m}")}),
                );
                count += 1;
            }
        }
    }

    for i in 1..=2 {
        put_doc(
            db,
            &format!("caregivers/{user_id}-cg{i}"),
            json!({"userId": user_id, "caregiverUserId": format!("cg-{i}")}),
        );
        count += 1;
    }
    put_doc(
        db,
        &format!("caregiver_invitations/{user_id}-inv1"),
        json!({"userId": user_id, "caregiverEmail": "invitee@example.com", "token": "tok"}),
    );
    count += 1;

    count
}

/// Gateway fake that records every attempted message and fails delivery
/// for tokens registered via `fail_token`.
pub struct RecordingGateway {
    attempts: Mutex<Vec<PushMessage>>,
    fail_tokens: Mutex<HashSet<String>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(Vec::new()),
            fail_tokens: Mutex::new(HashSet::new()),
        })
    }

    /// Make every send to `token` fail with a delivery error.
    pub fn fail_token(&self, token: &str) {
        self.fail_tokens.lock().unwrap().insert(token.to_string());
    }

    /// All attempted messages, in attempt order.
    pub fn attempts(&self) -> Vec<PushMessage> {
        self.attempts.lock().unwrap().clone()
    }

    /// Number of attempted sends (including failed ones).
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// Tokens of all attempted sends.
    pub fn attempted_tokens(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.token.clone())
            .collect()
    }
}

#[async_trait]
impl PushGateway for RecordingGateway {
    async fn send(&self, message: &PushMessage) -> TdResult<()> {
        self.attempts.lock().unwrap().push(message.clone());
        if self.fail_tokens.lock().unwrap().contains(&message.token) {
            return Err(TdError::Delivery(format!(
                "unregistered token: {}",
                message.token
            )));
        }
        Ok(())
    }
}
