//! Trigger router: dispatches document-creation events to relay handlers.
//!
//! This is the in-process stand-in for the platform's trigger delivery.
//! It subscribes to the event bus, matches created documents by path
//! shape, and invokes the bound handler. Handler outcomes are logged and
//! absorbed here: a notification failure must never propagate to, or fail,
//! the write that triggered it.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use td_core::constants::collections;
use td_core::error::TdResult;

use crate::event_bus::StoreEvent;
use crate::relay::{RelayOutcome, RelayService};
use crate::service::{Service, ServiceState};

/// Routes document-creation events to the appropriate relay handler.
pub struct TriggerRouter {
    state: ServiceState,
    relay: Arc<RelayService>,
}

impl TriggerRouter {
    /// Create a new TriggerRouter.
    pub fn new(relay: Arc<RelayService>) -> Self {
        Self {
            state: ServiceState::Created,
            relay,
        }
    }

    /// Process one store event, routing creations to their handlers.
    pub async fn handle_event(&self, event: StoreEvent) -> Vec<RelayOutcome> {
        match event {
            StoreEvent::DocumentCreated { path, fields } => {
                self.handle_created(&path, &fields).await
            }
            _ => Vec::new(),
        }
    }

    /// Dispatch a created document by its path shape.
    ///
    /// Bindings:
    /// - `caregiver_invitations/{id}` -> invitation handler
    /// - `caregivers/{id}` -> assignment handler
    /// - `users/{userId}/logs/{logId}` -> missed-dose handler
    pub async fn handle_created(&self, path: &str, fields: &Value) -> Vec<RelayOutcome> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let outcomes = match segments.as_slice() {
            [c, _id] if *c == collections::CAREGIVER_INVITATIONS => {
                vec![self.relay.on_invitation_created(fields).await]
            }
            [c, _id] if *c == collections::CAREGIVERS => {
                vec![self.relay.on_caregiver_assigned(fields).await]
            }
            [c, user_id, l, log_id]
                if *c == collections::USERS && *l == collections::LOGS =>
            {
                self.relay.on_medicine_missed(user_id, log_id, fields).await
            }
            _ => {
                debug!("no trigger bound for path: {path}");
                Vec::new()
            }
        };

        for outcome in &outcomes {
            if let RelayOutcome::Failed { recipient, error } = outcome {
                warn!("trigger for {path} failed for recipient {recipient}: {error}");
            }
        }
        outcomes
    }

    /// Consume events from a bus subscription until the channel closes.
    ///
    /// Lagging (missed events under load) is logged and survived; every
    /// received creation is dispatched independently.
    pub async fn run(&self, mut rx: broadcast::Receiver<StoreEvent>) {
        info!("trigger router listening for store events");
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let outcomes = self.handle_event(event).await;
                    if !outcomes.is_empty() {
                        debug!("trigger produced {} outcome(s)", outcomes.len());
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("trigger router lagged, {missed} event(s) missed");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("trigger router stopped");
    }
}

impl Service for TriggerRouter {
    fn name(&self) -> &str {
        "router"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> TdResult<()> {
        self.state = ServiceState::Running;
        info!("trigger router initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> TdResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
