//! Custom error types for Pyro
//!
//! Every fallible operation in the library returns [`PyroResult`]. The
//! variants double as the error taxonomy of the command gateway: each one
//! maps to a stable `error_name` tag via [`PyroError::error_name`].

use thiserror::Error;

/// The main error type for Pyro operations
#[derive(Error, Debug)]
pub enum PyroError {
    /// No document with the given name exists
    #[error("Document not found: {name}")]
    NotFound { name: String },

    /// A document with the given name already exists
    #[error("Document already exists: {name}")]
    Conflict { name: String },

    /// The document name is not acceptable
    #[error("Invalid document name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A blob or serialized store could not be parsed
    #[error("Corrupt data: {0}")]
    CorruptFormat(String),

    /// Wrong password or tampered blob. Deliberately carries nothing else.
    #[error("Authentication failed")]
    Authentication,

    /// The operation requires an unlocked vault
    #[error("The vault is locked")]
    NotEncrypted,

    /// No vault exists yet; a password has to be set up first
    #[error("No vault has been set up yet")]
    NotInitialized,

    /// First-time setup was requested for an existing vault
    #[error("A vault already exists")]
    AlreadyInitialized,

    /// Password shorter than the configured minimum
    #[error("Password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Crypto failures other than authentication (bad parameters, RNG, ...)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PyroError {
    /// Create a "not found" error for a document
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a "conflict" error for a document
    pub fn conflict(name: impl Into<String>) -> Self {
        Self::Conflict { name: name.into() }
    }

    /// Stable tag the boundary layer switches on
    pub fn error_name(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFoundError",
            Self::Conflict { .. } => "ConflictError",
            Self::InvalidName { .. } => "InvalidNameError",
            Self::CorruptFormat(_) => "CorruptFormatError",
            Self::Authentication => "AuthenticationError",
            Self::NotEncrypted => "NotEncryptedError",
            Self::NotInitialized => "NotInitializedError",
            Self::AlreadyInitialized => "AlreadyInitializedError",
            Self::WeakPassword { .. } => "WeakPasswordError",
            Self::Config(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Encryption(_)
            | Self::Storage(_) => "InternalError",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}

impl From<std::io::Error> for PyroError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PyroError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Pyro operations
pub type PyroResult<T> = Result<T, PyroError>;
