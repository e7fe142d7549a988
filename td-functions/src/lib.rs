//! Tickdose Functions - Callable operations and trigger handlers.
//!
//! This crate provides the backend's function surface:
//! - Account eraser (callable): plan, atomic batch delete, blob purge
//! - Notification relay: invitation, assignment, and missed-dose handlers
//! - Trigger router mapping document-creation events to handlers
//! - Event bus (typed store events for in-process delivery)
//! - Service trait and registry (lifecycle, dependency injection)

pub mod service;
pub mod registry;
pub mod event_bus;
pub mod router;
pub mod eraser;
pub mod relay;

// Re-export key types
pub use service::{Service, ServiceState};
pub use registry::ServiceRegistry;
pub use event_bus::{EventBus, StoreEvent};
pub use router::TriggerRouter;
pub use eraser::{AuthContext, EraseSummary, EraserService, ErasurePlan};
pub use relay::{RelayOutcome, RelayService};
