//! In-memory document store
//!
//! Plain CRUD over an ordered collection of documents plus a flat binary
//! representation that the crypt engine seals. The store knows nothing about
//! encryption.
//!
//! ## Serialized format
//!
//! ```text
//! "PYRODOCS" | version: u16 | count: u32 | record*
//! record = name_len: u32 | name | content_len: u64 | content
//!          | created_at_ms: i64 | updated_at_ms: i64
//! ```
//!
//! All integers are little-endian.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{PyroError, PyroResult};
use crate::models::{validate_name, Document};

const STORE_MAGIC: &[u8; 8] = b"PYRODOCS";
const STORE_VERSION: u16 = 1;

/// Ordered collection of documents, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    /// Documents in creation order
    docs: Vec<Document>,
    /// Index: name -> position in `docs`
    by_name: HashMap<String, usize>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Whether a document with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Document names in creation order
    pub fn list(&self) -> Vec<String> {
        self.docs.iter().map(|d| d.name.clone()).collect()
    }

    /// All documents in creation order
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }

    /// Get a document by name
    pub fn document(&self, name: &str) -> PyroResult<&Document> {
        self.by_name
            .get(name)
            .map(|&i| &self.docs[i])
            .ok_or_else(|| PyroError::not_found(name))
    }

    /// Get a document's content by name
    pub fn get(&self, name: &str) -> PyroResult<&str> {
        self.document(name).map(|d| d.content.as_str())
    }

    /// Create a document, or overwrite the content of an existing one
    ///
    /// Overwriting keeps the document's position and creation time.
    pub fn put(&mut self, name: &str, content: impl Into<String>) -> PyroResult<()> {
        if let Some(&i) = self.by_name.get(name) {
            self.docs[i].set_content(content);
            return Ok(());
        }

        let doc = Document::new(name, content)?;
        self.insert(doc);
        Ok(())
    }

    /// Rename a document, keeping its position
    pub fn rename(&mut self, old: &str, new: &str) -> PyroResult<()> {
        let i = *self.by_name.get(old).ok_or_else(|| PyroError::not_found(old))?;
        if old == new {
            return Ok(());
        }
        validate_name(new)?;
        if self.by_name.contains_key(new) {
            return Err(PyroError::conflict(new));
        }

        if let Some((mut key, _)) = self.by_name.remove_entry(old) {
            key.zeroize();
        }
        self.by_name.insert(new.to_string(), i);
        let doc = &mut self.docs[i];
        doc.name.zeroize();
        doc.name = new.to_string();
        doc.updated_at = Utc::now();
        Ok(())
    }

    /// Delete a document
    pub fn delete(&mut self, name: &str) -> PyroResult<Document> {
        let (mut key, i) = self
            .by_name
            .remove_entry(name)
            .ok_or_else(|| PyroError::not_found(name))?;
        key.zeroize();
        let doc = self.docs.remove(i);
        for pos in self.by_name.values_mut() {
            if *pos > i {
                *pos -= 1;
            }
        }
        Ok(doc)
    }

    fn insert(&mut self, doc: Document) {
        self.by_name.insert(doc.name.clone(), self.docs.len());
        self.docs.push(doc);
    }

    /// Wipe every name and content held by the store, leaving it empty
    fn wipe(&mut self) {
        for (mut key, _) in self.by_name.drain() {
            key.zeroize();
        }
        self.docs.clear();
    }

    /// Encode the store into its flat byte representation
    pub fn serialize(&self) -> Vec<u8> {
        let body: usize = self
            .docs
            .iter()
            .map(|d| 4 + d.name.len() + 8 + d.content.len() + 16)
            .sum();
        let mut out = Vec::with_capacity(14 + body);

        out.extend_from_slice(STORE_MAGIC);
        out.extend_from_slice(&STORE_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.docs.len() as u32).to_le_bytes());

        for doc in &self.docs {
            out.extend_from_slice(&(doc.name.len() as u32).to_le_bytes());
            out.extend_from_slice(doc.name.as_bytes());
            out.extend_from_slice(&(doc.content.len() as u64).to_le_bytes());
            out.extend_from_slice(doc.content.as_bytes());
            out.extend_from_slice(&doc.created_at.timestamp_millis().to_le_bytes());
            out.extend_from_slice(&doc.updated_at.timestamp_millis().to_le_bytes());
        }
        out
    }

    /// Decode a store from bytes produced by [`DocumentStore::serialize`]
    pub fn deserialize(bytes: &[u8]) -> PyroResult<Self> {
        let mut reader = Reader::new(bytes);

        if reader.take(STORE_MAGIC.len())? != STORE_MAGIC {
            return Err(corrupt("wrong magic"));
        }
        let version = u16::from_le_bytes(reader.array()?);
        if version != STORE_VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }
        let count = u32::from_le_bytes(reader.array()?);

        let mut store = DocumentStore::new();
        for _ in 0..count {
            let name_len = u32::from_le_bytes(reader.array()?) as usize;
            let mut name = Zeroizing::new(reader.utf8(name_len)?);
            let content_len = usize::try_from(u64::from_le_bytes(reader.array()?))
                .map_err(|_| corrupt("content length overflows"))?;
            let mut content = Zeroizing::new(reader.utf8(content_len)?);
            let created_at = timestamp(i64::from_le_bytes(reader.array()?))?;
            let updated_at = timestamp(i64::from_le_bytes(reader.array()?))?;

            validate_name(&name).map_err(|e| match e {
                PyroError::InvalidName { reason, .. } => corrupt(format!("invalid name: {}", reason)),
                other => other,
            })?;
            if store.contains(&name) {
                return Err(corrupt("duplicate document name"));
            }
            store.insert(Document {
                name: std::mem::take(&mut *name),
                content: std::mem::take(&mut *content),
                created_at,
                updated_at,
            });
        }

        if !reader.is_empty() {
            return Err(corrupt("trailing bytes after last record"));
        }
        Ok(store)
    }
}

impl Zeroize for DocumentStore {
    fn zeroize(&mut self) {
        self.wipe();
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        self.wipe();
    }
}

fn corrupt(msg: impl Into<String>) -> PyroError {
    PyroError::CorruptFormat(format!("document store: {}", msg.into()))
}

fn timestamp(millis: i64) -> PyroResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| corrupt("timestamp out of range"))
}

/// Bounds-checked cursor over the serialized bytes
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, n: usize) -> PyroResult<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(corrupt("truncated record"));
        }
        let (head, rest) = self.bytes.split_at(n);
        self.bytes = rest;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> PyroResult<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    fn utf8(&mut self, n: usize) -> PyroResult<String> {
        let raw = self.take(n)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| corrupt("invalid UTF-8"))
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
