use thiserror::Error;

/// Core error type for the Pressflow workflow engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Ticket not found
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    /// Job type not found
    #[error("Job type not found: {0}")]
    JobTypeNotFound(String),

    /// The stored ticket version no longer matches the version a write was planned against
    #[error("Concurrent modification of ticket {ticket_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// Ticket being written
        ticket_id: String,
        /// Version the caller read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// State store error
    #[error("State store error: {0}")]
    StateStoreError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Whether a retry against fresh state may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::ConcurrencyConflict { .. })
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigurationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
