//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the vault.

pub mod document;
pub mod password;
pub mod vault;

pub use document::{handle_document_command, DocumentCommands};
pub use vault::{
    handle_config, handle_init, handle_passwd, handle_serve, handle_status, open_unlocked,
};
