//! Pyro - a password-locked vault for named text documents
//!
//! The vault keeps a set of documents that is either sealed on disk as a
//! single encrypted blob or decrypted in memory. Nothing about the documents,
//! not even their names, is observable while the vault is locked.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Data directory and settings
//! - `error`: Custom error types
//! - `crypto`: Argon2id key derivation and AES-256-GCM sealing
//! - `models`: The document model
//! - `storage`: In-memory document store, blob file, atomic writes
//! - `vault`: Lock/unlock state machine
//! - `gateway`: JSON command boundary
//! - `cli`, `display`, `logging`: The `pyro` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use pyro::config::{PyroPaths, Settings};
//! use pyro::vault::Vault;
//!
//! let paths = PyroPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let vault = Vault::open(&paths, settings)?;
//! vault.unlock("correct horse")?;
//! vault.put("notes", "hello")?;
//! vault.lock("correct horse")?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod storage;
pub mod vault;

pub use error::{PyroError, PyroResult};
pub use gateway::CommandGateway;
pub use vault::{Vault, VaultStatus};
