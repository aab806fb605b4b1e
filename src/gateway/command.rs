//! Wire types of the command gateway
//!
//! Requests are JSON objects tagged by `"cmd"`. Replies carry either `"ok"`
//! with a [`Response`] or `"error"` with a [`UserError`].

use serde::{Deserialize, Serialize};

use crate::crypto::SecureString;
use crate::error::PyroError;
use crate::vault::VaultStatus;

/// Details sent for every authentication failure
pub const AUTHENTICATION_DETAILS: &str = "Wrong password or damaged vault";

/// Tag for requests that could not be parsed
pub const PARSING_ERROR: &str = "ParsingError";

/// A command the boundary can send
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// List document names
    #[serde(rename = "load_documents", alias = "loadDocuments")]
    LoadDocuments,

    /// Create or overwrite a document
    #[serde(rename = "saveDocument")]
    SaveDocument { doc_name: String, text: String },

    /// Lock (`locking: true`) or unlock the vault
    #[serde(rename = "crypt")]
    Crypt {
        password: SecureString,
        locking: bool,
    },

    /// Read one document
    #[serde(rename = "getDocument")]
    GetDocument { doc_name: String },

    #[serde(rename = "renameDocument")]
    RenameDocument { old_name: String, new_name: String },

    #[serde(rename = "deleteDocument")]
    DeleteDocument { doc_name: String },

    /// First-time password setup
    #[serde(rename = "setupPassword")]
    SetupPassword { password: SecureString },

    #[serde(rename = "status")]
    Status,
}

impl Command {
    /// Command tag, safe to log
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadDocuments => "load_documents",
            Self::SaveDocument { .. } => "saveDocument",
            Self::Crypt { .. } => "crypt",
            Self::GetDocument { .. } => "getDocument",
            Self::RenameDocument { .. } => "renameDocument",
            Self::DeleteDocument { .. } => "deleteDocument",
            Self::SetupPassword { .. } => "setupPassword",
            Self::Status => "status",
        }
    }
}

/// A command with an optional correlation id echoed in the reply
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub command: Command,
}

/// Successful result of a command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Documents(Vec<String>),
    Document { doc_name: String, text: String },
    Status(VaultStatus),
    /// Serialized as `null`
    Ack,
}

/// Structured error handed to the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    pub error_name: String,
    pub details: Option<String>,
}

impl UserError {
    /// `ParsingError` with fixed details
    pub fn malformed(details: &str) -> Self {
        Self {
            error_name: PARSING_ERROR.to_string(),
            details: Some(details.to_string()),
        }
    }

    /// Error for a request line that is not a valid command
    pub fn parsing(err: &serde_json::Error) -> Self {
        use serde_json::error::Category;

        // The serde message may quote request values, passwords included
        let details = match err.classify() {
            Category::Syntax | Category::Eof => "Malformed JSON",
            Category::Data => "Unknown command or invalid arguments",
            Category::Io => "Could not read request",
        };
        Self::malformed(details)
    }
}

impl From<&PyroError> for UserError {
    fn from(err: &PyroError) -> Self {
        let details = match err {
            PyroError::Authentication => AUTHENTICATION_DETAILS.to_string(),
            other => other.to_string(),
        };
        Self {
            error_name: err.error_name().to_string(),
            details: Some(details),
        }
    }
}

impl From<PyroError> for UserError {
    fn from(err: PyroError) -> Self {
        Self::from(&err)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Ok(Response),
    Error(UserError),
}

/// One reply line
#[derive(Debug, Serialize)]
pub struct Reply {
    id: Option<u64>,
    #[serde(flatten)]
    outcome: Outcome,
}

impl Reply {
    pub fn new(id: Option<u64>, result: Result<Response, UserError>) -> Self {
        let outcome = match result {
            Ok(response) => Outcome::Ok(response),
            Err(error) => Outcome::Error(error),
        };
        Self { id, outcome }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // Only reachable if a response failed to serialize
            let id = self.id.map_or_else(|| "null".to_string(), |id| id.to_string());
            format!(
                r#"{{"id":{},"error":{{"error_name":"InternalError","details":null}}}}"#,
                id
            )
        })
    }
}
