//! Error types for mindsift.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using mindsift's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mindsift operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    /// A concurrent invocation already holds the note in PROCESSING
    #[error("Note is already being processed: {0}")]
    AlreadyProcessing(Uuid),

    /// No usable AI provider for the user: no stored key, no environment fallback
    #[error("No AI provider configured")]
    NoProviderConfigured,

    /// The AI vendor call failed (network, auth, rate limit, timeout)
    #[error("AI provider call failed: {0}")]
    ProviderCall(String),

    /// Model output did not contain a parsable JSON object
    #[error("Failed to parse AI response")]
    UnparsableResponse,

    /// Custom prompt template is unusable
    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    /// Stored credential could not be decrypted
    #[error("Credential error: {0}")]
    Credential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Job queue error
    #[error("Job error: {0}")]
    Job(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl From<mindsift_crypto::CryptoError> for Error {
    fn from(e: mindsift_crypto::CryptoError) -> Self {
        Error::Credential(e.to_string())
    }
}
