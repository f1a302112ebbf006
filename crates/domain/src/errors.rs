//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the KSeF bridge
///
/// `Config`, `SessionInit`, `Submission` and `ImportValidation` are the
/// operator-facing kinds; the remaining variants are produced by adapters and
/// usually end up wrapped by one of them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum KsefError {
    /// Missing credential, token, tax identifier or public key file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Challenge/response handshake failed (transport or remote rejection).
    #[error("Session initialization failed: {0}")]
    SessionInit(String),

    /// The invoice Send call failed.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Document-level JPK problem (unreadable XML, no matching namespace).
    #[error("Import validation failed: {0}")]
    ImportValidation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KsefError {
    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::SessionInit(_) => "session_init",
            Self::Submission(_) => "submission",
            Self::ImportValidation(_) => "import_validation",
            Self::Database(_) => "database",
            Self::Network(_) => "network",
            Self::Security(_) => "security",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for KSeF bridge operations
pub type Result<T> = std::result::Result<T, KsefError>;
