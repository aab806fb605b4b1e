//! Document CLI commands
//!
//! Each command is one-shot: unlock the vault, run the operation, and lock
//! it again with the same password if anything changed.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Subcommand;

use crate::display::document::{format_document_names, format_document_table};
use crate::error::{PyroError, PyroResult};
use crate::vault::Vault;

/// Document subcommands
#[derive(Subcommand)]
pub enum DocumentCommands {
    /// List documents
    #[command(alias = "ls")]
    List {
        /// Show sizes and timestamps
        #[arg(short, long)]
        long: bool,
    },
    /// Print a document
    #[command(alias = "cat")]
    Show {
        /// Document name
        name: String,
    },
    /// Create or overwrite a document
    Put {
        /// Document name
        name: String,
        /// Content (otherwise read from --file or stdin)
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,
        /// Read content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Rename a document
    #[command(alias = "mv")]
    Rename {
        /// Current name
        old: String,
        /// New name
        new: String,
    },
    /// Delete a document
    #[command(alias = "rm")]
    Delete {
        /// Document name
        name: String,
    },
}

impl DocumentCommands {
    /// Whether the command changes the vault contents
    pub fn mutates(&self) -> bool {
        !matches!(self, Self::List { .. } | Self::Show { .. })
    }
}

/// Handle document commands on an unlocked vault
///
/// Mutating commands lock the vault with `password` before returning, which
/// seals it under a fresh salt and nonce.
pub fn handle_document_command(
    vault: &Vault,
    password: &str,
    cmd: DocumentCommands,
) -> PyroResult<()> {
    let mutates = cmd.mutates();

    match cmd {
        DocumentCommands::List { long } => {
            if long {
                println!("{}", format_document_table(&vault.summaries()?));
            } else {
                println!("{}", format_document_names(&vault.list()?));
            }
        }
        DocumentCommands::Show { name } => {
            print!("{}", vault.get(&name)?);
        }
        DocumentCommands::Put { name, text, file } => {
            let content = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path).map_err(|e| {
                    PyroError::Io(format!("Failed to read {}: {}", path.display(), e))
                })?,
                (None, None) => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let size = content.len();
            vault.put(&name, content)?;
            println!("Saved '{}' ({} bytes)", name, size);
        }
        DocumentCommands::Rename { old, new } => {
            vault.rename(&old, &new)?;
            println!("Renamed '{}' to '{}'", old, new);
        }
        DocumentCommands::Delete { name } => {
            vault.delete(&name)?;
            println!("Deleted '{}'", name);
        }
    }

    if mutates {
        vault.lock(password)?;
    }
    Ok(())
}
