//! Vault state types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::crypto::{DerivedKey, EncryptedBlob};
use crate::models::Document;
use crate::storage::DocumentStore;

/// The live state of a vault. Exactly one representation of the documents
/// exists at a time: the sealed blob or the plaintext store.
pub(crate) enum VaultState {
    /// No blob on disk and no password set
    Uninitialized,
    /// Contents only exist as the sealed blob
    Locked { blob: EncryptedBlob },
    /// Contents decrypted in memory; `key` is the session key used for auto-lock
    Unlocked { store: DocumentStore, key: DerivedKey },
}

impl VaultState {
    pub(crate) fn status(&self) -> VaultStatus {
        match self {
            Self::Uninitialized => VaultStatus::Uninitialized,
            Self::Locked { .. } => VaultStatus::Locked,
            Self::Unlocked { store, .. } => VaultStatus::Unlocked {
                documents: store.len(),
            },
        }
    }
}

/// Externally visible vault state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VaultStatus {
    /// First-time password setup required
    Uninitialized,
    /// Locked; unlock to see documents
    Locked,
    /// Unlocked with the given number of documents
    Unlocked { documents: usize },
}

impl VaultStatus {
    /// Whether documents are accessible
    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::Unlocked { .. })
    }
}

impl fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "not set up"),
            Self::Locked => write!(f, "locked"),
            Self::Unlocked { documents: 1 } => write!(f, "unlocked (1 document)"),
            Self::Unlocked { documents } => write!(f, "unlocked ({} documents)", documents),
        }
    }
}

/// Document metadata without content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            name: doc.name.clone(),
            size: doc.size(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}
