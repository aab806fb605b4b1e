//! The vault: lock/unlock state machine over the document store
//!
//! A `Vault` owns the only live representation of the documents, either
//! the sealed blob (`Locked`) or the decrypted store (`Unlocked`). Every
//! transition happens under one mutex so that a lock never interleaves with
//! a document mutation. Key derivation runs outside the mutex.

mod state;

pub use state::{DocumentSummary, VaultStatus};

use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::{PyroPaths, Settings};
use crate::crypto::{decrypt_with_key, derive_fresh_key, derive_key, encrypt, DerivedKey};
use crate::error::{PyroError, PyroResult};
use crate::storage::file_io::temp_path_for;
use crate::storage::{BlobFile, DocumentStore};

use state::VaultState;

struct Inner {
    state: VaultState,
    /// Bumped on every state transition
    generation: u64,
    last_activity: Instant,
}

/// Process-wide encrypted document vault
///
/// `Vault` is `Send + Sync`; share it as `Arc<Vault>`.
pub struct Vault {
    settings: Settings,
    blob_file: BlobFile,
    inner: Mutex<Inner>,
}

impl Vault {
    /// Open the vault stored under `paths`
    ///
    /// The vault starts `Locked` if a blob exists, otherwise `Uninitialized`.
    pub fn open(paths: &PyroPaths, settings: Settings) -> PyroResult<Self> {
        let blob_file = BlobFile::new(paths.vault_file());

        // Leftover from a write that never reached its rename
        let temp_path = temp_path_for(blob_file.path());
        if temp_path.exists() {
            debug!("removing stale temp file");
            if let Err(e) = fs::remove_file(&temp_path) {
                warn!(error = %e, "failed to remove stale temp file");
            }
        }

        let state = match blob_file.load()? {
            Some(blob) => VaultState::Locked { blob },
            None => VaultState::Uninitialized,
        };
        info!(state = %state.status(), "vault opened");

        Ok(Self {
            settings,
            blob_file,
            inner: Mutex::new(Inner {
                state,
                generation: 0,
                last_activity: Instant::now(),
            }),
        })
    }

    /// Settings this vault was opened with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn inner(&self) -> PyroResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| PyroError::Storage(format!("Vault lock poisoned: {}", e)))
    }

    /// Current state
    pub fn status(&self) -> PyroResult<VaultStatus> {
        Ok(self.inner()?.state.status())
    }

    /// First-time password setup
    ///
    /// Seals an empty store under `password` and writes it at once, leaving
    /// the vault unlocked.
    pub fn initialize(&self, password: &str) -> PyroResult<()> {
        if !matches!(self.inner()?.state, VaultState::Uninitialized) {
            return Err(PyroError::AlreadyInitialized);
        }
        self.settings.check_password(password)?;

        let key = derive_fresh_key(password, &self.settings.kdf)?;
        let store = DocumentStore::new();
        let plaintext = Zeroizing::new(store.serialize());
        let blob = encrypt(&plaintext, &key)?;

        let mut inner = self.inner()?;
        // Another caller may have finished setup while we derived the key
        if !matches!(inner.state, VaultState::Uninitialized) {
            return Err(PyroError::AlreadyInitialized);
        }
        self.blob_file.store(&blob)?;
        inner.state = VaultState::Unlocked { store, key };
        inner.generation += 1;
        inner.last_activity = Instant::now();

        info!("vault initialized");
        Ok(())
    }

    /// Decrypt the blob into memory
    ///
    /// Already unlocked is a no-op. On failure the vault stays locked.
    pub fn unlock(&self, password: &str) -> PyroResult<()> {
        loop {
            let (blob, generation) = {
                let inner = self.inner()?;
                match &inner.state {
                    VaultState::Uninitialized => return Err(PyroError::NotInitialized),
                    VaultState::Unlocked { .. } => return Ok(()),
                    VaultState::Locked { blob } => (blob.clone(), inner.generation),
                }
            };

            let key = derive_key(password, blob.salt(), blob.params())?;
            let plaintext = decrypt_with_key(&blob, &key).map_err(|e| {
                warn!("unlock attempt failed");
                e
            })?;
            let store = DocumentStore::deserialize(&plaintext)?;

            let mut inner = self.inner()?;
            if inner.generation != generation {
                // The blob was replaced while we were decrypting; start over
                continue;
            }
            let documents = store.len();
            inner.state = VaultState::Unlocked { store, key };
            inner.generation += 1;
            inner.last_activity = Instant::now();

            info!(documents, "vault unlocked");
            return Ok(());
        }
    }

    /// Seal the documents under `password` and discard the plaintext
    ///
    /// `password` may differ from the one used to unlock; the vault is then
    /// re-keyed. A fresh salt and nonce are used every time. The password
    /// policy only applies to first-time setup.
    pub fn lock(&self, password: &str) -> PyroResult<()> {
        match self.inner()?.state {
            VaultState::Uninitialized => return Err(PyroError::NotInitialized),
            VaultState::Locked { .. } => return Err(PyroError::NotEncrypted),
            VaultState::Unlocked { .. } => {}
        }

        let key = derive_fresh_key(password, &self.settings.kdf)?;

        let mut inner = self.inner()?;
        self.seal(&mut inner, Some(&key))?;
        info!("vault locked");
        Ok(())
    }

    /// Seal with the session key if unlocked
    ///
    /// Returns whether the vault was locked by this call.
    pub fn auto_lock(&self) -> PyroResult<bool> {
        let mut inner = self.inner()?;
        if !matches!(inner.state, VaultState::Unlocked { .. }) {
            return Ok(false);
        }
        self.seal(&mut inner, None)?;
        info!("vault auto-locked");
        Ok(true)
    }

    /// Auto-lock if the idle timeout has passed since the last operation
    pub fn lock_if_idle(&self) -> PyroResult<bool> {
        let Some(timeout) = self.settings.idle_timeout_secs else {
            return Ok(false);
        };
        {
            let inner = self.inner()?;
            if !matches!(inner.state, VaultState::Unlocked { .. })
                || inner.last_activity.elapsed() < Duration::from_secs(timeout)
            {
                return Ok(false);
            }
        }
        debug!(timeout, "idle timeout reached");
        self.auto_lock()
    }

    /// Tear down at process exit
    pub fn shutdown(&self) -> PyroResult<()> {
        if self.settings.auto_lock_on_shutdown {
            self.auto_lock().map_err(|e| {
                warn!(error = %e, "auto-lock on shutdown failed");
                e
            })?;
        } else if self.status()?.is_unlocked() {
            warn!("shutting down unlocked; unsaved changes are discarded");
        }
        Ok(())
    }

    /// Serialize, encrypt and write the store, then flip to `Locked`
    ///
    /// `key` of `None` uses the session key. On any error the state is
    /// left untouched.
    fn seal(&self, inner: &mut Inner, key: Option<&DerivedKey>) -> PyroResult<()> {
        let blob = match &inner.state {
            VaultState::Uninitialized => return Err(PyroError::NotInitialized),
            VaultState::Locked { .. } => return Err(PyroError::NotEncrypted),
            VaultState::Unlocked {
                store,
                key: session_key,
            } => {
                let plaintext = Zeroizing::new(store.serialize());
                encrypt(&plaintext, key.unwrap_or(session_key))?
            }
        };
        self.blob_file.store(&blob)?;
        debug!(bytes = blob.encoded_len(), "blob written");

        // Drops the plaintext store and the session key
        inner.state = VaultState::Locked { blob };
        inner.generation += 1;
        Ok(())
    }

    fn with_store<T>(&self, f: impl FnOnce(&DocumentStore) -> PyroResult<T>) -> PyroResult<T> {
        let mut inner = self.inner()?;
        inner.last_activity = Instant::now();
        match &inner.state {
            VaultState::Unlocked { store, .. } => f(store),
            _ => Err(PyroError::NotEncrypted),
        }
    }

    fn with_store_mut<T>(
        &self,
        f: impl FnOnce(&mut DocumentStore) -> PyroResult<T>,
    ) -> PyroResult<T> {
        let mut inner = self.inner()?;
        inner.last_activity = Instant::now();
        match &mut inner.state {
            VaultState::Unlocked { store, .. } => f(store),
            _ => Err(PyroError::NotEncrypted),
        }
    }

    /// Document names in creation order
    pub fn list(&self) -> PyroResult<Vec<String>> {
        self.with_store(|store| Ok(store.list()))
    }

    /// Names, sizes and timestamps in creation order
    pub fn summaries(&self) -> PyroResult<Vec<DocumentSummary>> {
        self.with_store(|store| Ok(store.documents().map(DocumentSummary::from).collect()))
    }

    /// Content of a document
    pub fn get(&self, name: &str) -> PyroResult<String> {
        self.with_store(|store| store.get(name).map(str::to_string))
    }

    /// Create or overwrite a document
    pub fn put(&self, name: &str, content: impl Into<String>) -> PyroResult<()> {
        let content = content.into();
        let bytes = content.len();
        self.with_store_mut(|store| store.put(name, content))?;
        debug!(bytes, "document saved");
        Ok(())
    }

    /// Rename a document, keeping its position
    pub fn rename(&self, old: &str, new: &str) -> PyroResult<()> {
        self.with_store_mut(|store| store.rename(old, new))?;
        debug!("document renamed");
        Ok(())
    }

    /// Delete a document
    pub fn delete(&self, name: &str) -> PyroResult<()> {
        self.with_store_mut(|store| store.delete(name).map(|_| ()))?;
        debug!("document deleted");
        Ok(())
    }
}
