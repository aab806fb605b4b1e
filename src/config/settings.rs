//! User settings for Pyro
//!
//! Holds the key-derivation work factor applied to newly sealed vaults,
//! the password policy, and the auto-lock behaviour.

use serde::{Deserialize, Serialize};

use super::paths::PyroPaths;
use crate::crypto::key_derivation::KdfParams;
use crate::error::PyroError;
use crate::storage::file_io::{read_json, write_json_atomic};

/// User settings for Pyro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Argon2id work factor for new blobs
    pub kdf: KdfParams,

    /// Minimum accepted password length when a password is set
    pub min_password_length: usize,

    /// Lock automatically after this many idle seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,

    /// Seal the vault with the session key when the process shuts down
    pub auto_lock_on_shutdown: bool,

    /// Default tracing filter when `PYRO_LOG` is not set
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: 1,
            kdf: KdfParams::default(),
            min_password_length: 8,
            idle_timeout_secs: None,
            auto_lock_on_shutdown: true,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &PyroPaths) -> Result<Self, PyroError> {
        let settings: Settings = read_json(paths.settings_file())
            .map_err(|e| PyroError::Config(format!("Failed to load settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &PyroPaths) -> Result<(), PyroError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Reject settings that could never produce a usable vault
    pub fn validate(&self) -> Result<(), PyroError> {
        self.kdf
            .check()
            .map_err(|e| PyroError::Config(format!("Invalid kdf settings: {}", e)))?;
        if self.idle_timeout_secs == Some(0) {
            return Err(PyroError::Config("idle_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Check a password against the configured policy
    pub fn check_password(&self, password: &str) -> Result<(), PyroError> {
        if password.chars().count() < self.min_password_length {
            return Err(PyroError::WeakPassword {
                min_length: self.min_password_length,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.kdf, KdfParams::default());
        assert_eq!(settings.min_password_length, 8);
        assert!(settings.auto_lock_on_shutdown);
        assert!(settings.idle_timeout_secs.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PyroPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.idle_timeout_secs = Some(300);
        settings.kdf = KdfParams::new(1024, 1, 1);
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PyroPaths::with_base_dir(temp_dir.path().to_path_buf());

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PyroPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"min_password_length": 12}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.min_password_length, 12);
        assert_eq!(loaded.kdf, KdfParams::default());
    }

    #[test]
    fn test_invalid_kdf_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PyroPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(
            paths.settings_file(),
            r#"{"kdf": {"memory_cost": 1, "time_cost": 0, "parallelism": 1}}"#,
        )
        .unwrap();

        assert!(matches!(
            Settings::load_or_create(&paths),
            Err(PyroError::Config(_))
        ));
    }

    #[test]
    fn test_password_policy() {
        let settings = Settings::default();
        assert!(settings.check_password("long enough").is_ok());
        assert!(matches!(
            settings.check_password("short"),
            Err(PyroError::WeakPassword { min_length: 8 })
        ));
    }
}
