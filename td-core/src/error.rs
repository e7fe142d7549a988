//! Global error types for the Tickdose backend.
//!
//! All error categories across the backend are unified into a single
//! `TdError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using TdError.
pub type TdResult<T> = Result<T, TdError>;

/// Unified error type covering all error categories in the backend.
#[derive(Error, Debug)]
pub enum TdError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Document store errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    /// A document path was malformed.
    #[error("invalid document path: {0}")]
    InvalidPath(String),

    // -- Blob storage errors --
    /// Blob store operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    // -- Push gateway errors --
    /// HTTP request to the push gateway failed.
    #[error("http error: {0}")]
    Http(String),

    /// Request to the push gateway timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Push gateway rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Push gateway returned an error response.
    #[error("gateway error (status {status}): {message}")]
    GatewayError {
        /// HTTP status code.
        status: u16,
        /// Error message from the gateway.
        message: String,
    },

    /// A push message could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),

    // -- Callable errors --
    /// The caller did not present an authenticated identity.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// A callable operation failed internally; the cause is attached.
    #[error("internal error: {0}")]
    Internal(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service failed to initialize.
    #[error("service init error: {0}")]
    ServiceInit(String),

    /// A service is not yet initialized.
    #[error("service not initialized: {0}")]
    ServiceNotInitialized(String),

    /// A service operation failed.
    #[error("service error: {0}")]
    Service(String),

    // -- Generic --
    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TdError {
    /// Caller-facing classification string for callable responses.
    ///
    /// Callable operations surface exactly two classes to clients:
    /// `unauthenticated` for missing identity and `internal` for everything
    /// else that escapes the operation.
    pub fn code(&self) -> &'static str {
        match self {
            TdError::Unauthenticated(_) => "unauthenticated",
            _ => "internal",
        }
    }
}

impl From<serde_json::Error> for TdError {
    fn from(e: serde_json::Error) -> Self {
        TdError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for TdError {
    fn from(e: toml::de::Error) -> Self {
        TdError::Config(e.to_string())
    }
}
