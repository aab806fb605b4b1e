//! Crypt engine for Pyro
//!
//! Argon2id key derivation and AES-256-GCM authenticated encryption of the
//! serialized document store.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{decrypt, decrypt_with_key, encrypt, EncryptedBlob};
pub use key_derivation::{derive_fresh_key, derive_key, generate_salt, DerivedKey, KdfParams};
pub use secure_memory::SecureString;
