//! Error types for RelayQ
//!
//! Defines all error types used throughout the gateway.

use thiserror::Error;

/// Main error type for RelayQ operations
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound payload is missing required structure
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Broker connection settings are unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Broker could not be reached (network failure, timeout)
    #[error("Broker unreachable: {0}")]
    Connection(String),

    /// Broker refused the credential
    #[error("Broker authentication failed: {0}")]
    Authentication(String),

    /// Broker accepted the connection but rejected the message
    #[error("Broker rejected message (status {status}): {detail}")]
    Rejected {
        /// Status reported by the broker
        status: u16,
        /// Broker-provided detail
        detail: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure was caused by the caller rather than the broker
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidRequest(_))
    }
}

/// Result type alias for RelayQ operations
pub type Result<T> = std::result::Result<T, Error>;
