//! Tickdose Store - Document store, blob store, models, and migrations.
//!
//! This crate owns all data persistence for the backend: SQLite-backed
//! document storage with atomic batch deletes, document path helpers,
//! typed models parsed from document bodies, versioned migrations, and
//! the filesystem blob store used for per-user object prefixes.

pub mod db;
pub mod schema;
pub mod paths;
pub mod documents;
pub mod blob;
pub mod models;
pub mod migrations;

// Re-export key types
pub use db::{Database, DbPool, StoreStats};
pub use documents::{Document, WriteBatch};
pub use paths::DocPath;
pub use blob::BlobStore;
pub use models::profile::UserProfile;
pub use models::caregiver::CaregiverLink;
pub use models::invitation::CaregiverInvitation;
pub use models::dose_log::DoseLog;
