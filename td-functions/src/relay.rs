//! Notification relay: trigger handlers for caregiver push notifications.
//!
//! Three handlers react to document creation: caregiver invitations,
//! caregiver assignments, and missed-dose logs. Notifications are an
//! advisory side channel: every failure is logged and absorbed, and the
//! triggering write is always treated as successful. Handlers return
//! typed outcomes per recipient so callers and tests can assert on what
//! happened instead of reading logs.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use td_core::constants::{channels, collections, fallback_names};
use td_core::error::TdResult;
use td_push::{PushGateway, PushMessage};
use td_store::paths::{self, DocPath};
use td_store::{CaregiverInvitation, CaregiverLink, Database, DoseLog, UserProfile};

use crate::service::{Service, ServiceState};

/// Outcome of one notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The gateway accepted the message for the recipient.
    Sent { recipient: String },
    /// Nothing was sent; the reason is informational, not an error.
    Skipped { reason: String },
    /// A send was attempted (or a lookup required for it) and failed.
    Failed { recipient: String, error: String },
}

impl RelayOutcome {
    fn skipped(reason: &str) -> Self {
        Self::Skipped {
            reason: reason.to_string(),
        }
    }

    /// Whether this outcome represents an accepted delivery.
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Service implementing the three relay trigger handlers.
pub struct RelayService {
    state: ServiceState,
    database: Database,
    gateway: Arc<dyn PushGateway>,
    /// Base URL used to build invitation deep links.
    invite_url_base: String,
}

impl RelayService {
    /// Create a new RelayService.
    pub fn new(database: Database, gateway: Arc<dyn PushGateway>, invite_url_base: &str) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            gateway,
            invite_url_base: invite_url_base.trim_end_matches('/').to_string(),
        }
    }

    /// Handle creation of a caregiver invitation.
    ///
    /// Sends an invitation notification to the invitee when they already
    /// have an account (matched by email, case-insensitively) with a
    /// delivery token.
    pub async fn on_invitation_created(&self, fields: &Value) -> RelayOutcome {
        let invitation = CaregiverInvitation::from_fields(fields);
        if !invitation.is_deliverable() {
            debug!("invitation missing email or token");
            return RelayOutcome::skipped("invitation missing email or token");
        }
        let email = invitation.caregiver_email.as_deref().unwrap_or_default();
        let token = invitation.token.as_deref().unwrap_or_default();

        // Find the invitee's account by normalized email
        let caregiver_doc =
            match self
                .database
                .query_field_eq_ci(collections::USERS, "email", email)
            {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    debug!("no user found with email: {email}");
                    return RelayOutcome::skipped("no user found for invitation email");
                }
                Err(e) => {
                    warn!("user lookup failed for invitation: {e}");
                    return RelayOutcome::Failed {
                        recipient: email.to_string(),
                        error: e.to_string(),
                    };
                }
            };

        let caregiver_user_id = caregiver_doc.id().to_string();
        let profile = UserProfile::from_fields(&caregiver_doc.fields);
        let Some(fcm_token) = profile.fcm_token.filter(|t| !t.is_empty()) else {
            debug!("no delivery token for caregiver: {caregiver_user_id}");
            return RelayOutcome::skipped("caregiver has no delivery token");
        };

        let patient_id = invitation.user_id.as_deref();
        let patient_name = self.display_name(patient_id, fallback_names::SOMEONE);
        let invitation_url = format!("{}?token={token}", self.invite_url_base);

        let message = PushMessage::new(
            &fcm_token,
            "New Caregiver Invitation",
            &format!("{patient_name} has invited you to be their caregiver"),
            channels::CAREGIVER_INVITATIONS,
        )
        .with_data("type", "caregiver_invitation")
        .with_data("invitationToken", token)
        .with_data("patientUserId", patient_id.unwrap_or_default())
        .with_data("patientName", &patient_name)
        .with_data("invitationUrl", &invitation_url);

        dispatch(&*self.gateway, &message, &caregiver_user_id).await
    }

    /// Handle creation of a caregiver relationship.
    ///
    /// Notifies the caregiver that they were assigned to a patient.
    pub async fn on_caregiver_assigned(&self, fields: &Value) -> RelayOutcome {
        let link = CaregiverLink::from_fields(fields);
        let Some(caregiver_user_id) = link.caregiver_user_id else {
            debug!("no caregiverUserId found in caregiver record");
            return RelayOutcome::skipped("caregiver record missing caregiverUserId");
        };

        let patient_name = self.display_name(link.user_id.as_deref(), fallback_names::SOMEONE);

        let profile = match self.profile(&caregiver_user_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("caregiver user document not found: {caregiver_user_id}");
                return RelayOutcome::skipped("caregiver user document not found");
            }
            Err(e) => {
                warn!("caregiver lookup failed: {e}");
                return RelayOutcome::Failed {
                    recipient: caregiver_user_id,
                    error: e.to_string(),
                };
            }
        };
        let Some(fcm_token) = profile.fcm_token.filter(|t| !t.is_empty()) else {
            debug!("no delivery token for caregiver: {caregiver_user_id}");
            return RelayOutcome::skipped("caregiver has no delivery token");
        };

        let message = PushMessage::new(
            &fcm_token,
            "Caregiver Assignment",
            &format!("You have been assigned as a caregiver for {patient_name}"),
            channels::CAREGIVER_NOTIFICATIONS,
        )
        .with_data("type", "caregiver_assigned")
        .with_data("userId", link.user_id.as_deref().unwrap_or_default())
        .with_data("patientName", &patient_name);

        dispatch(&*self.gateway, &message, &caregiver_user_id).await
    }

    /// Handle creation of a dose log under a user.
    ///
    /// Only logs with status "missed" trigger notifications; anything else
    /// returns without performing a single lookup. Every caregiver with
    /// the notify flag is notified independently and concurrently; one
    /// recipient's failure never suppresses the others.
    pub async fn on_medicine_missed(
        &self,
        user_id: &str,
        log_id: &str,
        fields: &Value,
    ) -> Vec<RelayOutcome> {
        let log = DoseLog::from_fields(fields);
        if !log.is_missed() {
            return Vec::new();
        }

        let patient_name = self.display_name(Some(user_id), fallback_names::PATIENT);
        let medicine_name = self.medicine_name(user_id, log.medicine_id.as_deref());

        let links = match self
            .database
            .query_field_eq(collections::CAREGIVERS, "userId", &json!(user_id))
        {
            Ok(docs) => docs,
            Err(e) => {
                warn!("caregiver lookup failed for missed dose: {e}");
                return vec![RelayOutcome::Failed {
                    recipient: String::new(),
                    error: e.to_string(),
                }];
            }
        };

        let flagged: Vec<CaregiverLink> = links
            .iter()
            .map(|doc| CaregiverLink::from_fields(&doc.fields))
            .filter(|link| link.notify_on_missed)
            .collect();

        if flagged.is_empty() {
            debug!("no caregivers to notify for user: {user_id}");
            return Vec::new();
        }

        let mut handles = Vec::with_capacity(flagged.len());
        for link in flagged {
            let database = self.database.clone();
            let gateway = Arc::clone(&self.gateway);
            let user_id = user_id.to_string();
            let log_id = log_id.to_string();
            let patient_name = patient_name.clone();
            let medicine_id = log.medicine_id.clone().unwrap_or_default();
            let medicine_name = medicine_name.clone();

            handles.push(tokio::spawn(async move {
                notify_caregiver(
                    &database,
                    &*gateway,
                    &link,
                    &user_id,
                    &patient_name,
                    &medicine_id,
                    &medicine_name,
                    &log_id,
                )
                .await
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => outcomes.push(RelayOutcome::Failed {
                    recipient: String::new(),
                    error: format!("notification task failed: {e}"),
                }),
            }
        }

        let sent = outcomes.iter().filter(|o| o.is_sent()).count();
        info!("missed-dose notifications: {sent}/{} sent for user {user_id}", outcomes.len());
        outcomes
    }

    /// Load a user's profile, or None when the document is absent.
    fn profile(&self, user_id: &str) -> TdResult<Option<UserProfile>> {
        let path = paths::user_doc(user_id)?;
        Ok(self
            .database
            .get_document(&path)?
            .map(|doc| UserProfile::from_fields(&doc.fields)))
    }

    /// Resolve a user's display name with a fallback.
    fn display_name(&self, user_id: Option<&str>, default: &str) -> String {
        let Some(user_id) = user_id else {
            return default.to_string();
        };
        match self.profile(user_id) {
            Ok(Some(profile)) => profile.display_name_or(default).to_string(),
            Ok(None) => default.to_string(),
            Err(e) => {
                warn!("profile lookup failed for {user_id}: {e}");
                default.to_string()
            }
        }
    }

    /// Resolve a medicine's display name; a missing document is tolerated.
    fn medicine_name(&self, user_id: &str, medicine_id: Option<&str>) -> String {
        let Some(medicine_id) = medicine_id else {
            return fallback_names::MEDICINE.to_string();
        };
        let collection = paths::user_collection(user_id, collections::MEDICINES);
        let path = match DocPath::new(&collection, medicine_id) {
            Ok(path) => path,
            Err(_) => return fallback_names::MEDICINE.to_string(),
        };
        match self.database.get_document(&path) {
            Ok(Some(doc)) => doc
                .fields
                .get("name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback_names::MEDICINE)
                .to_string(),
            Ok(None) => fallback_names::MEDICINE.to_string(),
            Err(e) => {
                warn!("medicine lookup failed for {medicine_id}: {e}");
                fallback_names::MEDICINE.to_string()
            }
        }
    }
}

/// Send one message and fold the result into an outcome.
async fn dispatch(gateway: &dyn PushGateway, message: &PushMessage, recipient: &str) -> RelayOutcome {
    match gateway.send(message).await {
        Ok(()) => {
            info!("push notification sent to caregiver: {recipient}");
            RelayOutcome::Sent {
                recipient: recipient.to_string(),
            }
        }
        Err(e) => {
            warn!("push delivery to {recipient} failed: {e}");
            RelayOutcome::Failed {
                recipient: recipient.to_string(),
                error: e.to_string(),
            }
        }
    }
}

/// Resolve one caregiver's token and send the missed-dose notification.
#[allow(clippy::too_many_arguments)]
async fn notify_caregiver(
    database: &Database,
    gateway: &dyn PushGateway,
    link: &CaregiverLink,
    user_id: &str,
    patient_name: &str,
    medicine_id: &str,
    medicine_name: &str,
    log_id: &str,
) -> RelayOutcome {
    let Some(caregiver_user_id) = link.caregiver_user_id.as_deref() else {
        return RelayOutcome::skipped("caregiver record missing caregiverUserId");
    };

    let path = match paths::user_doc(caregiver_user_id) {
        Ok(path) => path,
        Err(e) => {
            return RelayOutcome::Failed {
                recipient: caregiver_user_id.to_string(),
                error: e.to_string(),
            }
        }
    };
    let profile = match database.get_document(&path) {
        Ok(Some(doc)) => UserProfile::from_fields(&doc.fields),
        Ok(None) => {
            debug!("caregiver user document not found: {caregiver_user_id}");
            return RelayOutcome::skipped("caregiver user document not found");
        }
        Err(e) => {
            warn!("caregiver lookup failed: {e}");
            return RelayOutcome::Failed {
                recipient: caregiver_user_id.to_string(),
                error: e.to_string(),
            };
        }
    };
    let Some(fcm_token) = profile.fcm_token.filter(|t| !t.is_empty()) else {
        debug!("no delivery token for caregiver: {caregiver_user_id}");
        return RelayOutcome::skipped("caregiver has no delivery token");
    };

    let message = PushMessage::new(
        &fcm_token,
        "Medicine Missed",
        &format!("{patient_name} missed their {medicine_name} dose"),
        channels::CAREGIVER_NOTIFICATIONS,
    )
    .with_data("type", "medicine_missed")
    .with_data("userId", user_id)
    .with_data("userName", patient_name)
    .with_data("medicineId", medicine_id)
    .with_data("medicineName", medicine_name)
    .with_data("logId", log_id);

    dispatch(gateway, &message, caregiver_user_id).await
}

impl Service for RelayService {
    fn name(&self) -> &str {
        "relay"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> TdResult<()> {
        self.state = ServiceState::Running;
        info!("relay service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> TdResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
