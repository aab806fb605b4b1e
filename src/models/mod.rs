//! Core data models for Pyro

pub mod document;

pub use document::{validate_name, Document, MAX_NAME_LEN};
