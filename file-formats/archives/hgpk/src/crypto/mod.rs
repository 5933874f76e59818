//! Password protection for patch archives
//!
//! Protected archives derive a key from the password and a per-archive salt
//! ([`derive_key`]), store a short [`encryption_check`] value in the header so
//! a wrong password is rejected before any entry is touched, and XOR every
//! payload byte with a keystream addressed by absolute file offset
//! ([`transform`]).
//!
//! This is a lightweight obfuscation layer that keeps casual users from
//! browsing game assets. It provides no integrity protection of its own and
//! must not be relied on to keep secrets from a motivated attacker: the key
//! check value and an unauthenticated XOR stream are both present on disk.
//!
//! # Examples
//!
//! ```
//! use hgpk::crypto::{check_key, derive_key, encryption_check, generate_salt, transform};
//!
//! let salt = generate_salt();
//! let key = derive_key("hunter2", &salt, 1_000);
//! let check = encryption_check(&key);
//! assert!(check_key(&key, &check));
//!
//! let mut data = b"secret line".to_vec();
//! transform(&key, 4096, &mut data);
//! transform(&key, 4096, &mut data);
//! assert_eq!(data, b"secret line");
//! ```

mod kdf;
mod keystream;

pub use kdf::{
    DEFAULT_KDF_ITERATIONS, KEY_SIZE, MAX_KDF_ITERATIONS, PatchKey, SALT_SIZE, derive_key,
    generate_salt,
};
pub use keystream::{CHECK_SIZE, check_key, encryption_check, transform};
