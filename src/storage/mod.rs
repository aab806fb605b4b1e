//! Storage layer for Pyro
//!
//! The in-memory document store, the on-disk blob file, and the atomic
//! file helpers both of them (and the settings file) go through.

pub mod blob_file;
pub mod document_store;
pub mod file_io;

pub use blob_file::BlobFile;
pub use document_store::DocumentStore;
pub use file_io::{read_json, write_atomic, write_json_atomic};
