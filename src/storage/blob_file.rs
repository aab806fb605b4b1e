//! The single encrypted blob file on disk
//!
//! This is the only durable artifact of document content. It is always
//! replaced atomically.

use std::path::{Path, PathBuf};

use crate::crypto::EncryptedBlob;
use crate::error::PyroResult;

use super::file_io::{read_bytes, write_atomic};

/// Handle on the vault blob file
#[derive(Debug, Clone)]
pub struct BlobFile {
    path: PathBuf,
}

impl BlobFile {
    /// Create a handle for the given path; nothing is touched on disk
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the blob file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a blob has been written
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and parse the blob, or `None` if none has been written yet
    pub fn load(&self) -> PyroResult<Option<EncryptedBlob>> {
        read_bytes(&self.path)?
            .map(|bytes| EncryptedBlob::from_bytes(&bytes))
            .transpose()
    }

    /// Atomically replace the blob on disk
    pub fn store(&self, blob: &EncryptedBlob) -> PyroResult<()> {
        write_atomic(&self.path, &blob.to_bytes())
    }
}
