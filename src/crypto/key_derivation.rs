//! Key derivation using Argon2id
//!
//! Derives encryption keys from user passwords using Argon2id,
//! a memory-hard key derivation function resistant to GPU/ASIC attacks.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{PyroError, PyroResult};

/// Length of the derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Length of the random KDF salt in bytes
pub const SALT_LEN: usize = 16;

const MAX_MEMORY_COST: u32 = 4 * 1024 * 1024; // 4 GiB
const MAX_TIME_COST: u32 = 64;
const MAX_PARALLELISM: u32 = 64;

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism degree (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Create params with specific values
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Check the params are within the range accepted for a vault
    ///
    /// The upper bounds keep a crafted blob header from making unlock
    /// allocate or spin without limit.
    pub fn check(&self) -> Result<(), &'static str> {
        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err("parallelism out of range");
        }
        if self.time_cost == 0 || self.time_cost > MAX_TIME_COST {
            return Err("time cost out of range");
        }
        if self.memory_cost < 8 * self.parallelism || self.memory_cost > MAX_MEMORY_COST {
            return Err("memory cost out of range");
        }
        Ok(())
    }
}

/// A derived encryption key together with the salt and params that produced it
pub struct DerivedKey {
    key: Zeroizing<[u8; KEY_LEN]>,
    salt: [u8; SALT_LEN],
    params: KdfParams,
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Salt the key was derived with
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Work factor the key was derived with
    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Generate a fresh random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an encryption key from a password and salt
///
/// Deterministic: the same password, salt and params always give the same key.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> PyroResult<DerivedKey> {
    params
        .check()
        .map_err(|e| PyroError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| PyroError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key[..])
        .map_err(|e| PyroError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(DerivedKey {
        key,
        salt: *salt,
        params: *params,
    })
}

/// Derive a key under a newly generated salt
pub fn derive_fresh_key(password: &str, params: &KdfParams) -> PyroResult<DerivedKey> {
    derive_key(password, &generate_salt(), params)
}
