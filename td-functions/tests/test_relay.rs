//! Integration tests for the notification relay and trigger router.
//!
//! Covers recipient resolution (case-insensitive email match, token
//! presence), display-name fallbacks, per-recipient independence of the
//! missed-dose fan-out, and end-to-end routing through the event bus.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use td_functions::event_bus::StoreEvent;
use td_functions::relay::{RelayOutcome, RelayService};
use td_functions::router::TriggerRouter;

use common::RecordingGateway;

const INVITE_BASE: &str = "https://tickdose.app/invite";

fn make_relay(
    gateway: Arc<RecordingGateway>,
) -> (RelayService, td_store::Database, tempfile::TempDir) {
    let (db, _blobs, dir) = common::create_test_env();
    let relay = RelayService::new(db.clone(), gateway, INVITE_BASE);
    (relay, db, dir)
}

// ---- Invitation created ----

#[tokio::test]
async fn invitation_notifies_matching_user_case_insensitively() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());

    common::seed_user(&db, "u1", "Ana", "ana@example.com", None);
    common::seed_user(&db, "u2", "Carla", "Carla@Example.com", Some("tok-2"));

    let outcome = relay
        .on_invitation_created(&json!({
            "userId": "u1",
            "caregiverEmail": "carla@example.COM",
            "token": "inv-123",
        }))
        .await;

    assert_eq!(
        outcome,
        RelayOutcome::Sent {
            recipient: "u2".into()
        }
    );

    let attempts = gateway.attempts();
    assert_eq!(attempts.len(), 1);
    let msg = &attempts[0];
    assert_eq!(msg.token, "tok-2");
    assert_eq!(msg.notification.title, "New Caregiver Invitation");
    assert_eq!(
        msg.notification.body,
        "Ana has invited you to be their caregiver"
    );
    assert_eq!(msg.data.get("type").unwrap(), "caregiver_invitation");
    assert_eq!(msg.data.get("invitationToken").unwrap(), "inv-123");
    assert_eq!(msg.data.get("patientUserId").unwrap(), "u1");
    assert_eq!(msg.data.get("patientName").unwrap(), "Ana");
    assert_eq!(
        msg.data.get("invitationUrl").unwrap(),
        "https://tickdose.app/invite?token=inv-123"
    );
    assert_eq!(msg.android.notification.channel_id, "caregiver_invitations");
}

#[tokio::test]
async fn invitation_with_blank_token_sends_nothing() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u2", "Carla", "carla@example.com", Some("tok-2"));

    let outcome = relay
        .on_invitation_created(&json!({
            "userId": "u1",
            "caregiverEmail": "carla@example.com",
            "token": "",
        }))
        .await;

    assert!(matches!(outcome, RelayOutcome::Skipped { .. }));
    assert_eq!(gateway.attempt_count(), 0);
}

#[tokio::test]
async fn invitation_with_no_matching_user_sends_nothing() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u2", "Carla", "carla@example.com", Some("tok-2"));

    let outcome = relay
        .on_invitation_created(&json!({
            "userId": "u1",
            "caregiverEmail": "nobody@example.com",
            "token": "inv-123",
        }))
        .await;

    assert!(matches!(outcome, RelayOutcome::Skipped { .. }));
    assert_eq!(gateway.attempt_count(), 0);
}

#[tokio::test]
async fn invitation_to_user_without_token_sends_nothing() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u2", "Carla", "carla@example.com", None);

    let outcome = relay
        .on_invitation_created(&json!({
            "userId": "u1",
            "caregiverEmail": "carla@example.com",
            "token": "inv-123",
        }))
        .await;

    assert!(matches!(outcome, RelayOutcome::Skipped { .. }));
    assert_eq!(gateway.attempt_count(), 0);
}

#[tokio::test]
async fn invitation_from_unknown_inviter_defaults_to_someone() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u2", "Carla", "carla@example.com", Some("tok-2"));

    let outcome = relay
        .on_invitation_created(&json!({
            "userId": "ghost",
            "caregiverEmail": "carla@example.com",
            "token": "inv-123",
        }))
        .await;

    assert!(outcome.is_sent());
    let msg = &gateway.attempts()[0];
    assert_eq!(msg.data.get("patientName").unwrap(), "Someone");
    assert_eq!(
        msg.notification.body,
        "Someone has invited you to be their caregiver"
    );
}

// ---- Caregiver assigned ----

#[tokio::test]
async fn assignment_notifies_caregiver() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u1", "Ben", "ben@example.com", None);
    common::seed_user(&db, "u2", "Carla", "carla@example.com", Some("tok-2"));

    let outcome = relay
        .on_caregiver_assigned(&json!({
            "userId": "u1",
            "caregiverUserId": "u2",
            "notifyOnMissed": true,
        }))
        .await;

    assert_eq!(
        outcome,
        RelayOutcome::Sent {
            recipient: "u2".into()
        }
    );

    let msg = &gateway.attempts()[0];
    assert_eq!(msg.token, "tok-2");
    assert_eq!(msg.notification.title, "Caregiver Assignment");
    assert_eq!(
        msg.notification.body,
        "You have been assigned as a caregiver for Ben"
    );
    assert_eq!(msg.data.get("type").unwrap(), "caregiver_assigned");
    assert_eq!(msg.data.get("userId").unwrap(), "u1");
    assert_eq!(
        msg.android.notification.channel_id,
        "caregiver_notifications"
    );
}

#[tokio::test]
async fn assignment_for_caregiver_without_token_completes_quietly() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u1", "Ben", "ben@example.com", None);
    common::seed_user(&db, "u2", "Carla", "carla@example.com", None);

    let outcome = relay
        .on_caregiver_assigned(&json!({
            "userId": "u1",
            "caregiverUserId": "u2",
        }))
        .await;

    assert!(matches!(outcome, RelayOutcome::Skipped { .. }));
    assert_eq!(gateway.attempt_count(), 0);
}

#[tokio::test]
async fn assignment_for_missing_caregiver_doc_completes_quietly() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u1", "Ben", "ben@example.com", None);

    let outcome = relay
        .on_caregiver_assigned(&json!({
            "userId": "u1",
            "caregiverUserId": "ghost",
        }))
        .await;

    assert!(matches!(outcome, RelayOutcome::Skipped { .. }));
    assert_eq!(gateway.attempt_count(), 0);
}

// ---- Medicine missed ----

#[tokio::test]
async fn missed_dose_notifies_each_flagged_caregiver_independently() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());

    common::seed_user(&db, "u1", "Ana", "ana@example.com", None);
    common::put_doc(&db, "users/u1/medicines/m1", json!({"name": "Aspirin"}));
    common::seed_user(&db, "u2", "Carla", "carla@example.com", Some("tok-2"));
    common::seed_user(&db, "u3", "Dan", "dan@example.com", Some("tok-3"));
    common::seed_user(&db, "u4", "Eve", "eve@example.com", Some("tok-4"));

    common::put_doc(
        &db,
        "caregivers/c1",
        json!({"userId": "u1", "caregiverUserId": "u2", "notifyOnMissed": true}),
    );
    common::put_doc(
        &db,
        "caregivers/c2",
        json!({"userId": "u1", "caregiverUserId": "u3", "notifyOnMissed": true}),
    );
    common::put_doc(
        &db,
        "caregivers/c3",
        json!({"userId": "u1", "caregiverUserId": "u4", "notifyOnMissed": false}),
    );

    // One recipient's delivery fails; the other must still go through
    gateway.fail_token("tok-2");

    let outcomes = relay
        .on_medicine_missed("u1", "l1", &json!({"status": "missed", "medicineId": "m1"}))
        .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(gateway.attempt_count(), 2);

    let mut tokens = gateway.attempted_tokens();
    tokens.sort();
    assert_eq!(tokens, vec!["tok-2", "tok-3"]);

    let sent = outcomes.iter().filter(|o| o.is_sent()).count();
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, RelayOutcome::Failed { .. }))
        .count();
    assert_eq!(sent, 1);
    assert_eq!(failed, 1);

    // Message content resolves patient and medicine names
    let msg = &gateway.attempts()[0];
    assert_eq!(msg.notification.title, "Medicine Missed");
    assert_eq!(msg.notification.body, "Ana missed their Aspirin dose");
    assert_eq!(msg.data.get("type").unwrap(), "medicine_missed");
    assert_eq!(msg.data.get("medicineName").unwrap(), "Aspirin");
    assert_eq!(msg.data.get("logId").unwrap(), "l1");
}

#[tokio::test]
async fn non_missed_log_triggers_nothing() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u1", "Ana", "ana@example.com", None);
    common::put_doc(
        &db,
        "caregivers/c1",
        json!({"userId": "u1", "caregiverUserId": "u2", "notifyOnMissed": true}),
    );

    let outcomes = relay
        .on_medicine_missed("u1", "l1", &json!({"status": "taken", "medicineId": "m1"}))
        .await;

    assert!(outcomes.is_empty());
    assert_eq!(gateway.attempt_count(), 0);
}

#[tokio::test]
async fn missed_dose_with_no_flagged_caregivers_triggers_nothing() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    common::seed_user(&db, "u1", "Ana", "ana@example.com", None);
    common::put_doc(
        &db,
        "caregivers/c1",
        json!({"userId": "u1", "caregiverUserId": "u2", "notifyOnMissed": false}),
    );

    let outcomes = relay
        .on_medicine_missed("u1", "l1", &json!({"status": "missed"}))
        .await;

    assert!(outcomes.is_empty());
    assert_eq!(gateway.attempt_count(), 0);
}

#[tokio::test]
async fn missed_dose_tolerates_missing_medicine_and_profile() {
    let gateway = RecordingGateway::new();
    let (relay, db, _dir) = make_relay(gateway.clone());
    // No patient profile, no medicine document
    common::seed_user(&db, "u2", "Carla", "carla@example.com", Some("tok-2"));
    common::put_doc(
        &db,
        "caregivers/c1",
        json!({"userId": "u1", "caregiverUserId": "u2", "notifyOnMissed": true}),
    );

    let outcomes = relay
        .on_medicine_missed("u1", "l1", &json!({"status": "missed", "medicineId": "ghost"}))
        .await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_sent());

    let msg = &gateway.attempts()[0];
    assert_eq!(msg.notification.body, "Patient missed their medicine dose");
}

// ---- Router over the event bus ----

#[tokio::test]
async fn router_dispatches_created_documents_from_the_bus() {
    let gateway = RecordingGateway::new();
    let (db, _blobs, _dir) = common::create_test_env();
    common::seed_user(&db, "u1", "Ben", "ben@example.com", None);
    common::seed_user(&db, "u2", "Carla", "carla@example.com", Some("tok-2"));

    let relay = RelayService::new(db.clone(), gateway.clone(), INVITE_BASE);
    let router = Arc::new(TriggerRouter::new(Arc::new(relay)));

    let bus = common::create_test_event_bus();
    let rx = bus.subscribe();
    let worker = {
        let router = Arc::clone(&router);
        tokio::spawn(async move { router.run(rx).await })
    };

    let fields = json!({"userId": "u1", "caregiverUserId": "u2"});
    common::put_doc(&db, "caregivers/c1", fields.clone());
    bus.emit(StoreEvent::DocumentCreated {
        path: "caregivers/c1".into(),
        fields,
    });

    // Dropping the bus closes the channel and stops the router loop
    drop(bus);
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("router did not stop")
        .unwrap();

    assert_eq!(gateway.attempt_count(), 1);
    assert_eq!(gateway.attempts()[0].token, "tok-2");
}
