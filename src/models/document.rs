//! Document model
//!
//! A named piece of UTF-8 text. Documents only exist inside an unlocked
//! vault; their names and timestamps are encrypted along with the content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::PyroError;

/// Longest accepted document name, in bytes
pub const MAX_NAME_LEN: usize = 255;

/// A named text document
///
/// Name and content are wiped from memory when the document is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique name within the vault
    pub name: String,

    /// Text content
    pub content: String,

    /// When the document was created
    pub created_at: DateTime<Utc>,

    /// When the content or name last changed
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document, validating its name
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self, PyroError> {
        let name = name.into();
        validate_name(&name)?;

        let now = Utc::now();
        Ok(Self {
            name,
            content: content.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the content and bump `updated_at`
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content.zeroize();
        self.content = content.into();
        self.updated_at = Utc::now();
    }

    /// Content size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

impl Zeroize for Document {
    fn zeroize(&mut self) {
        self.name.zeroize();
        self.content.zeroize();
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Check that a name is usable as a document key
///
/// Names must be non-empty, at most [`MAX_NAME_LEN`] bytes, and free of
/// control characters (NUL and newline included).
pub fn validate_name(name: &str) -> Result<(), PyroError> {
    let reason = if name.is_empty() {
        "name cannot be empty"
    } else if name.len() > MAX_NAME_LEN {
        "name is longer than 255 bytes"
    } else if name.chars().any(char::is_control) {
        "name contains a control character"
    } else {
        return Ok(());
    };

    Err(PyroError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document() {
        let doc = Document::new("notes", "hello").unwrap();
        assert_eq!(doc.name, "notes");
        assert_eq!(doc.content, "hello");
        assert_eq!(doc.created_at, doc.updated_at);
        assert_eq!(doc.size(), 5);
    }

    #[test]
    fn test_set_content_bumps_updated_at() {
        let mut doc = Document::new("notes", "hello").unwrap();
        let created = doc.created_at;
        doc.set_content("bye");
        assert_eq!(doc.content, "bye");
        assert_eq!(doc.created_at, created);
        assert!(doc.updated_at >= created);
    }

    #[test]
    fn test_zeroize_clears_text() {
        let mut doc = Document::new("diary", "dear diary").unwrap();
        doc.zeroize();
        assert!(doc.name.is_empty());
        assert!(doc.content.is_empty());
        assert_eq!(doc.size(), 0);
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("Shopping list").is_ok());
        assert!(validate_name("日記").is_ok());
        assert!(matches!(
            validate_name(""),
            Err(PyroError::InvalidName { .. })
        ));
        assert!(validate_name("a\0b").is_err());
        assert!(validate_name("line\nbreak").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_invalid_name_rejected_on_create() {
        let err = Document::new("", "text").unwrap_err();
        assert_eq!(err.error_name(), "InvalidNameError");
    }
}
