//! Error types for Noetiq.

use thiserror::Error;

/// Result type alias using Noetiq's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for session, catalog, and gateway operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The storage gateway rejected the unlocking credential.
    ///
    /// Blocking: the session must be treated as locked again.
    #[error("Credential rejected: {0}")]
    Credential(String),

    /// A local precondition failed before any gateway call was made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The gateway call itself failed for any reason other than the credential.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway could not find the addressed vault or note.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A note operation was requested while no vault is open.
    #[error("No vault is open")]
    NoVaultOpen,

    /// An editing operation was requested while no note is active and ready.
    #[error("No note is active")]
    NoActiveNote,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error means the credential is no longer valid.
    pub fn is_credential(&self) -> bool {
        matches!(self, Error::Credential(_))
    }

    /// Whether this error was raised locally without reaching the gateway.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
