//! Vault CLI commands: setup, status, password change, and the gateway

use std::io;
use std::sync::Arc;

use crate::config::{PyroPaths, Settings};
use crate::crypto::SecureString;
use crate::display::document::{format_config, format_status};
use crate::error::{PyroError, PyroResult};
use crate::gateway::CommandGateway;
use crate::vault::{Vault, VaultStatus};

use super::password::{new_password_or_prompt, password_or_prompt};

/// Open the vault and unlock it for a one-shot command
///
/// Returns the password too so the command can lock with it afterwards.
pub fn open_unlocked(
    paths: &PyroPaths,
    settings: &Settings,
    password: Option<&SecureString>,
) -> PyroResult<(Vault, SecureString)> {
    let vault = Vault::open(paths, settings.clone())?;
    if vault.status()? == VaultStatus::Uninitialized {
        return Err(PyroError::NotInitialized);
    }
    let password = password_or_prompt(password, "Password: ")?;
    vault.unlock(&password)?;
    Ok((vault, password))
}

/// First-time password setup
pub fn handle_init(
    paths: &PyroPaths,
    settings: &Settings,
    password: Option<&SecureString>,
) -> PyroResult<()> {
    let vault = Vault::open(paths, settings.clone())?;
    if vault.status()? != VaultStatus::Uninitialized {
        return Err(PyroError::AlreadyInitialized);
    }

    println!("Setting up a new vault at: {}", paths.base_dir().display());
    println!("If you forget this password, your documents cannot be recovered.");
    println!();

    let password = new_password_or_prompt(password, settings)?;
    paths.ensure_directories()?;
    if !paths.settings_file().exists() {
        settings.save(paths)?;
    }
    vault.initialize(&password)?;

    println!("Vault created.");
    Ok(())
}

/// Show vault state
pub fn handle_status(paths: &PyroPaths, settings: &Settings) -> PyroResult<()> {
    let vault = Vault::open(paths, settings.clone())?;
    println!("{}", format_status(&vault.status()?, paths));
    Ok(())
}

/// Show paths and settings
pub fn handle_config(paths: &PyroPaths, settings: &Settings) -> PyroResult<()> {
    println!("{}", format_config(paths, settings));
    Ok(())
}

/// Re-encrypt the vault under a new password
pub fn handle_passwd(
    paths: &PyroPaths,
    settings: &Settings,
    password: Option<&SecureString>,
    new_password: Option<&SecureString>,
) -> PyroResult<()> {
    let (vault, _) = open_unlocked(paths, settings, password)?;
    let new_password = new_password_or_prompt(new_password, settings)?;
    vault.lock(&new_password)?;
    println!("Password changed.");
    Ok(())
}

/// Run the command gateway on stdin/stdout until stdin closes
pub fn handle_serve(paths: &PyroPaths, settings: &Settings) -> PyroResult<()> {
    paths.ensure_directories()?;
    let vault = Arc::new(Vault::open(paths, settings.clone())?);
    let gateway = CommandGateway::new(vault);
    gateway.serve(io::stdin().lock(), io::stdout())
}
