//! Password-based key derivation

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::fmt;

/// Size of a derived key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the per-archive salt in bytes
pub const SALT_SIZE: usize = 16;

/// PBKDF2 rounds used when the builder is not told otherwise
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Largest iteration count a header may request
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// A key derived from a patch password
#[derive(Clone, PartialEq, Eq)]
pub struct PatchKey([u8; KEY_SIZE]);

impl PatchKey {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for PatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PatchKey(..)")
    }
}

/// Derive a key from a password and salt with PBKDF2-HMAC-SHA256
///
/// The same password, salt and iteration count always reproduce the same key,
/// which is what lets a later open verify the header's check value.
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> PatchKey {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations.max(1), &mut key);
    PatchKey(key)
}

/// Generate a fresh random salt for a new archive
pub fn generate_salt() -> [u8; SALT_SIZE] {
    rand::random::<[u8; SALT_SIZE]>()
}
