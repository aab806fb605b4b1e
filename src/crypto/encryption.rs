//! AES-256-GCM encryption/decryption of the vault blob
//!
//! Each encryption operation generates a unique nonce. The blob header
//! (magic, version, KDF params, salt, nonce) is authenticated as associated
//! data, so tampering with any byte of the blob is detected.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::error::{PyroError, PyroResult};

use super::key_derivation::{derive_key, DerivedKey, KdfParams, SALT_LEN};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

const BLOB_MAGIC: &[u8; 8] = b"PYROVLT1";
const BLOB_VERSION: u16 = 1;

/// magic | version | memory | time | parallelism | salt | nonce
pub const HEADER_LEN: usize = 8 + 2 + 4 + 4 + 4 + SALT_LEN + NONCE_SIZE;

/// The encrypted-at-rest form of the whole document set
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    params: KdfParams,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_SIZE],
    /// Ciphertext followed by the integrity tag
    sealed: Vec<u8>,
}

impl EncryptedBlob {
    /// KDF params recorded in the header
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// KDF salt
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// AES-GCM nonce
    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Ciphertext without the tag
    pub fn ciphertext(&self) -> &[u8] {
        &self.sealed[..self.sealed.len() - TAG_SIZE]
    }

    /// Integrity tag
    pub fn integrity_tag(&self) -> &[u8] {
        &self.sealed[self.sealed.len() - TAG_SIZE..]
    }

    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.sealed.len()
    }

    fn header_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..8].copy_from_slice(BLOB_MAGIC);
        buf[8..10].copy_from_slice(&BLOB_VERSION.to_le_bytes());
        buf[10..14].copy_from_slice(&self.params.memory_cost.to_le_bytes());
        buf[14..18].copy_from_slice(&self.params.time_cost.to_le_bytes());
        buf[18..22].copy_from_slice(&self.params.parallelism.to_le_bytes());
        buf[22..22 + SALT_LEN].copy_from_slice(&self.salt);
        buf[22 + SALT_LEN..].copy_from_slice(&self.nonce);
        buf
    }

    /// Encode the blob for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.header_bytes());
        out.extend_from_slice(&self.sealed);
        out
    }

    /// Decode a stored blob
    ///
    /// Only the structure is checked here; authenticity is checked on decrypt.
    pub fn from_bytes(bytes: &[u8]) -> PyroResult<Self> {
        if bytes.len() < HEADER_LEN + TAG_SIZE {
            return Err(PyroError::CorruptFormat("vault blob is truncated".into()));
        }
        if &bytes[0..8] != BLOB_MAGIC {
            return Err(PyroError::CorruptFormat("not a vault blob".into()));
        }
        let version = u16::from_le_bytes([bytes[8], bytes[9]]);
        if version != BLOB_VERSION {
            return Err(PyroError::CorruptFormat(format!(
                "unsupported vault blob version {}",
                version
            )));
        }

        let params = KdfParams::new(
            read_u32(&bytes[10..14]),
            read_u32(&bytes[14..18]),
            read_u32(&bytes[18..22]),
        );
        params
            .check()
            .map_err(|e| PyroError::CorruptFormat(format!("vault blob header: {}", e)))?;

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[22..22 + SALT_LEN]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[22 + SALT_LEN..HEADER_LEN]);

        Ok(Self {
            params,
            salt,
            nonce,
            sealed: bytes[HEADER_LEN..].to_vec(),
        })
    }
}

// Never print the ciphertext
impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("params", &self.params)
            .field("len", &self.encoded_len())
            .finish()
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Encrypt plaintext under a derived key
///
/// Generates a random nonce for each call; the blob records the key's salt
/// and params so the key can be re-derived from the password on unlock.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> PyroResult<EncryptedBlob> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| PyroError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);

    let mut blob = EncryptedBlob {
        params: *key.params(),
        salt: *key.salt(),
        nonce: nonce_bytes,
        sealed: Vec::new(),
    };
    let aad = blob.header_bytes();

    blob.sealed = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|e| PyroError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(blob)
}

/// Decrypt a blob with an already derived key
///
/// The tag is verified before any plaintext is returned. A key derived for
/// another salt, a wrong password and a tampered blob all give
/// [`PyroError::Authentication`].
pub fn decrypt_with_key(blob: &EncryptedBlob, key: &DerivedKey) -> PyroResult<Zeroizing<Vec<u8>>> {
    if key.salt() != blob.salt() || key.params() != blob.params() {
        return Err(PyroError::Authentication);
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| PyroError::Encryption(format!("Failed to create cipher: {}", e)))?;
    let aad = blob.header_bytes();

    cipher
        .decrypt(
            Nonce::from_slice(&blob.nonce),
            Payload {
                msg: &blob.sealed,
                aad: &aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| PyroError::Authentication)
}

/// Re-derive the key from the blob's salt and the password, then decrypt
pub fn decrypt(blob: &EncryptedBlob, password: &str) -> PyroResult<Zeroizing<Vec<u8>>> {
    let key = derive_key(password, blob.salt(), blob.params())?;
    decrypt_with_key(blob, &key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::{derive_fresh_key, KdfParams};

    fn cheap() -> KdfParams {
        KdfParams::new(1024, 1, 1)
    }

    fn test_key(password: &str) -> DerivedKey {
        derive_fresh_key(password, &cheap()).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key("test_password");
        let plaintext = b"Hello, World!";

        let blob = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&blob, "test_password").unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn test_encrypt_twice_differs() {
        let plaintext = b"Hello, World!";

        let blob1 = encrypt(plaintext, &test_key("pw")).unwrap();
        let blob2 = encrypt(plaintext, &test_key("pw")).unwrap();

        assert_ne!(blob1.salt(), blob2.salt());
        assert_ne!(blob1.nonce(), blob2.nonce());
        assert_ne!(blob1.to_bytes(), blob2.to_bytes());
    }

    #[test]
    fn test_same_key_fresh_nonce() {
        let key = test_key("pw");
        let blob1 = encrypt(b"same", &key).unwrap();
        let blob2 = encrypt(b"same", &key).unwrap();

        assert_eq!(blob1.salt(), blob2.salt());
        assert_ne!(blob1.nonce(), blob2.nonce());
    }

    #[test]
    fn test_wrong_password_fails() {
        let blob = encrypt(b"Hello, World!", &test_key("password1")).unwrap();

        let result = decrypt(&blob, "password2");
        assert!(matches!(result, Err(PyroError::Authentication)));
    }

    #[test]
    fn test_key_for_other_salt_fails() {
        let blob = encrypt(b"secret", &test_key("pw")).unwrap();
        let other = test_key("pw");

        let result = decrypt_with_key(&blob, &other);
        assert!(matches!(result, Err(PyroError::Authentication)));
    }

    #[test]
    fn test_tampered_bytes_fail_authentication() {
        let key = test_key("pw");
        let bytes = encrypt(b"Hello, World!", &key).unwrap().to_bytes();

        // every byte of the ciphertext, the tag, the salt and the nonce
        for i in 22..bytes.len() {
            let mut tampered = bytes.clone();
            tampered[i] ^= 0x01;
            let blob = EncryptedBlob::from_bytes(&tampered).unwrap();
            assert!(
                matches!(decrypt(&blob, "pw"), Err(PyroError::Authentication)),
                "byte {} not detected",
                i
            );
        }
    }

    #[test]
    fn test_tampered_params_fail() {
        let key = test_key("pw");
        let mut bytes = encrypt(b"Hello", &key).unwrap().to_bytes();
        // time cost 1 -> 2
        bytes[14] = 2;
        let blob = EncryptedBlob::from_bytes(&bytes).unwrap();
        assert!(matches!(decrypt(&blob, "pw"), Err(PyroError::Authentication)));
    }

    #[test]
    fn test_blob_parts() {
        let key = test_key("pw");
        let blob = encrypt(b"abc", &key).unwrap();

        assert_eq!(blob.ciphertext().len(), 3);
        assert_eq!(blob.integrity_tag().len(), TAG_SIZE);
        assert_eq!(blob.encoded_len(), HEADER_LEN + 3 + TAG_SIZE);

        let decoded = EncryptedBlob::from_bytes(&blob.to_bytes()).unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_structural_errors_are_corrupt_format() {
        let key = test_key("pw");
        let bytes = encrypt(b"abc", &key).unwrap().to_bytes();

        let truncated = &bytes[..HEADER_LEN + TAG_SIZE - 1];
        assert!(matches!(
            EncryptedBlob::from_bytes(truncated),
            Err(PyroError::CorruptFormat(_))
        ));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            EncryptedBlob::from_bytes(&bad_magic),
            Err(PyroError::CorruptFormat(_))
        ));

        let mut bad_version = bytes.clone();
        bad_version[8] = 9;
        assert!(matches!(
            EncryptedBlob::from_bytes(&bad_version),
            Err(PyroError::CorruptFormat(_))
        ));

        let mut huge_memory = bytes;
        huge_memory[10..14].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            EncryptedBlob::from_bytes(&huge_memory),
            Err(PyroError::CorruptFormat(_))
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key("pw");
        let blob = encrypt(b"", &key).unwrap();
        let decrypted = decrypt_with_key(&blob, &key).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_large_plaintext() {
        let key = test_key("pw");
        let plaintext: Vec<u8> = (0..10000).map(|i| (i % 256) as u8).collect();

        let blob = encrypt(&plaintext, &key).unwrap();
        let decrypted = decrypt_with_key(&blob, &key).unwrap();

        assert_eq!(plaintext, *decrypted);
    }
}
