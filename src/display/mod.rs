//! Display formatting for terminal output

pub mod document;

pub use document::{format_config, format_document_names, format_document_table, format_status};
