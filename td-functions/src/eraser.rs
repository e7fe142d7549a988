//! Account eraser: callable deletion of all data owned by a user.
//!
//! The erase runs in three phases: a pure enumeration building the set of
//! document references to remove, one atomic batch commit covering every
//! staged document, and a best-effort concurrent purge of the user's blob
//! prefixes. The document phase is all-or-nothing; the blob phase is not
//! covered by that guarantee and is simply retried by re-invoking the
//! whole operation.

use serde_json::json;
use tracing::{error, info, warn};

use td_core::constants::{collections, storage_prefixes};
use td_core::error::{TdError, TdResult};
use td_store::paths::{self, DocPath};
use td_store::{BlobStore, Database, WriteBatch};

use crate::event_bus::{EventBus, StoreEvent};
use crate::service::{Service, ServiceState};

/// Authenticated caller identity, taken from the request's auth context.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The caller's user id.
    pub uid: String,
}

impl AuthContext {
    /// Create an auth context for the given user id.
    pub fn new(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
        }
    }
}

/// The set of document references staged for deletion, produced by the
/// enumeration phase before anything is committed.
#[derive(Debug)]
pub struct ErasurePlan {
    refs: Vec<DocPath>,
}

impl ErasurePlan {
    /// The staged document references.
    pub fn staged(&self) -> &[DocPath] {
        &self.refs
    }

    /// Number of staged documents.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether nothing was staged.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Convert the plan into a write batch ready to commit.
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for path in self.refs {
            batch.stage_delete(path);
        }
        batch
    }
}

/// Result of a completed erase.
#[derive(Debug, Clone)]
pub struct EraseSummary {
    /// Documents staged by the enumeration phase.
    pub documents_staged: usize,
    /// Documents actually removed by the batch (absent documents count zero).
    pub documents_removed: usize,
    /// Blob objects removed from the user's prefixes.
    pub objects_removed: usize,
}

/// Service implementing the account erase callable.
pub struct EraserService {
    state: ServiceState,
    database: Database,
    blobs: BlobStore,
    event_bus: EventBus,
}

impl EraserService {
    /// Create a new EraserService.
    pub fn new(database: Database, blobs: BlobStore, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            blobs,
            event_bus,
        }
    }

    /// Callable entry point: delete all data owned by the caller.
    ///
    /// Fails with the `unauthenticated` classification when no identity is
    /// presented, before any read occurs. Every other failure is surfaced
    /// as `internal` with the cause attached; the caller retries the whole
    /// operation, which is idempotent.
    pub async fn delete_user_data(&self, auth: Option<&AuthContext>) -> TdResult<EraseSummary> {
        let auth = auth.ok_or_else(|| {
            TdError::Unauthenticated("user must be authenticated to delete account".into())
        })?;

        info!("account erase requested for user {}", auth.uid);

        match self.erase(&auth.uid).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("error deleting user data for {}: {e}", auth.uid);
                Err(TdError::Internal(format!("failed to delete user data: {e}")))
            }
        }
    }

    /// Enumeration phase: collect every document reference owned by the
    /// user. Pure with respect to the store; nothing is modified.
    pub fn plan(&self, user_id: &str) -> TdResult<ErasurePlan> {
        let mut refs = Vec::new();

        // Owned-data collections nested under the user
        for name in collections::USER_OWNED {
            let collection = paths::user_collection(user_id, name);
            for doc in self.database.list_collection(&collection)? {
                refs.push(doc.path);
            }
        }

        // Conversations owned by the user, each with its messages
        let conversations =
            self.database
                .query_field_eq(collections::CONVERSATIONS, "userId", &json!(user_id))?;
        for conversation in conversations {
            let messages = conversation.path.subcollection(collections::MESSAGES);
            for message in self.database.list_collection(&messages)? {
                refs.push(message.path);
            }
            refs.push(conversation.path);
        }

        // Caregiver relationships and invitations referencing the user
        for doc in self
            .database
            .query_field_eq(collections::CAREGIVERS, "userId", &json!(user_id))?
        {
            refs.push(doc.path);
        }
        for doc in self.database.query_field_eq(
            collections::CAREGIVER_INVITATIONS,
            "userId",
            &json!(user_id),
        )? {
            refs.push(doc.path);
        }

        // The user's own root document
        refs.push(paths::user_doc(user_id)?);

        Ok(ErasurePlan { refs })
    }

    /// Full erase: plan, atomic batch commit, then blob purge.
    pub async fn erase(&self, user_id: &str) -> TdResult<EraseSummary> {
        let plan = self.plan(user_id)?;
        let documents_staged = plan.len();

        let documents_removed = plan.into_batch().commit(&self.database)?;
        info!(
            "erased {documents_removed}/{documents_staged} documents for user {user_id}"
        );

        let objects_removed = self.purge_blobs(user_id).await?;

        self.event_bus.emit(StoreEvent::UserErased {
            user_id: user_id.to_string(),
            documents_removed,
            objects_removed,
        });

        Ok(EraseSummary {
            documents_staged,
            documents_removed,
            objects_removed,
        })
    }

    /// Delete every blob object under the user's fixed prefixes.
    ///
    /// Objects are removed concurrently; one object's failure does not
    /// stop its siblings, but any failure surfaces after all deletes have
    /// been attempted so the caller knows to retry.
    async fn purge_blobs(&self, user_id: &str) -> TdResult<usize> {
        let mut names = Vec::new();
        for root in storage_prefixes::ALL {
            let prefix = storage_prefixes::for_user(root, user_id);
            names.extend(self.blobs.list_prefix(&prefix)?);
        }

        if names.is_empty() {
            return Ok(0);
        }

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let blobs = self.blobs.clone();
            handles.push(tokio::spawn(async move {
                let result = blobs.delete_object(&name).await;
                (name, result)
            }));
        }

        let mut removed = 0usize;
        let mut failures = 0usize;
        for handle in handles {
            match handle.await {
                Ok((_, Ok(()))) => removed += 1,
                Ok((name, Err(e))) => {
                    warn!("failed to delete object {name}: {e}");
                    failures += 1;
                }
                Err(e) => {
                    warn!("blob delete task failed: {e}");
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            return Err(TdError::Storage(format!(
                "{failures} object(s) could not be removed ({removed} removed)"
            )));
        }

        info!("purged {removed} blob object(s) for user {user_id}");
        Ok(removed)
    }
}

impl Service for EraserService {
    fn name(&self) -> &str {
        "eraser"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> TdResult<()> {
        self.state = ServiceState::Running;
        info!("eraser service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> TdResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}
