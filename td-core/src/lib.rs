//! Tickdose Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other Tickdose
//! backend crates:
//! - Application configuration (store, push gateway, storage settings)
//! - Global error types covering all error categories
//! - Structured logging with tracing
//! - Platform directory utilities
//! - Common constants (collection names, storage prefixes, channels)

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{TdError, TdResult};
pub use logging::init_logging;
pub use platform::Platform;
