//! Path management for Pyro
//!
//! ## Path Resolution Order
//!
//! 1. `PYRO_DATA_DIR` environment variable (if set)
//! 2. The platform data directory (`~/.local/share/pyro`, `%APPDATA%\pyro\data`, ...)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::PyroError;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PYRO_DATA_DIR";

/// Manages all paths used by Pyro
#[derive(Debug, Clone)]
pub struct PyroPaths {
    /// Base directory for all Pyro data
    base_dir: PathBuf,
}

impl PyroPaths {
    /// Create a new PyroPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, PyroError> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create PyroPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the encrypted vault blob
    pub fn vault_file(&self) -> PathBuf {
        self.base_dir.join("vault.pyro")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), PyroError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| PyroError::Io(format!("Failed to create data directory: {}", e)))
    }
}

fn resolve_default_path() -> Result<PathBuf, PyroError> {
    ProjectDirs::from("", "", "pyro")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| PyroError::Config("Could not determine a home directory".into()))
}
