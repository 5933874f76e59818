//! Patch header and encryption descriptor

use crate::crypto::{self, CHECK_SIZE, PatchKey, SALT_SIZE};
use crate::security::SecurityLimits;
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Patch archive signature ("HiGan Patch pacK")
pub const PATCH_MAGIC: [u8; 4] = *b"HGPK";

/// Format version written by this library
pub const FORMAT_VERSION: u16 = 1;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: u64 = 32;

/// Size of the encryption descriptor that follows the header of protected archives
pub const ENCRYPTION_DESCRIPTOR_SIZE: u64 = (SALT_SIZE + 4 + CHECK_SIZE) as u64;

/// Header flag bits
pub mod flags {
    /// Payloads are encrypted and an encryption descriptor follows the header
    pub const ENCRYPTED: u16 = 0x0001;

    /// Every flag bit this version understands
    pub const KNOWN: u16 = ENCRYPTED;
}

/// Fixed-size patch header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHeader {
    /// Format version
    pub version: u16,
    /// Flag bits, see [`flags`]
    pub flags: u16,
    /// Absolute offset of the table of contents
    pub toc_offset: u64,
    /// Length of the table of contents in bytes
    pub toc_size: u64,
    /// CRC32 of the table-of-contents bytes
    pub toc_crc32: u32,
}

impl PatchHeader {
    /// Whether the archive carries an encryption descriptor
    pub fn is_encrypted(&self) -> bool {
        self.flags & flags::ENCRYPTED != 0
    }

    /// Offset of the first payload byte
    pub fn data_start(&self) -> u64 {
        if self.is_encrypted() {
            HEADER_SIZE + ENCRYPTION_DESCRIPTOR_SIZE
        } else {
            HEADER_SIZE
        }
    }

    /// Read and validate a header
    ///
    /// Fails with a format error on a bad signature, an unknown version or
    /// unknown flag bits; nothing past the header is read in that case.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(truncated)?;
        if magic != PATCH_MAGIC {
            return Err(Error::invalid_format("Invalid patch header signature"));
        }

        let version = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let flags = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        if flags & !flags::KNOWN != 0 {
            return Err(Error::invalid_format(format!(
                "Unknown header flags: 0x{flags:04X}"
            )));
        }

        let toc_offset = reader.read_u64::<LittleEndian>().map_err(truncated)?;
        let toc_size = reader.read_u64::<LittleEndian>().map_err(truncated)?;
        let toc_crc32 = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let _reserved = reader.read_u32::<LittleEndian>().map_err(truncated)?;

        Ok(Self {
            version,
            flags,
            toc_offset,
            toc_size,
            toc_crc32,
        })
    }

    /// Write the header
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&PATCH_MAGIC)?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u64::<LittleEndian>(self.toc_offset)?;
        writer.write_u64::<LittleEndian>(self.toc_size)?;
        writer.write_u32::<LittleEndian>(self.toc_crc32)?;
        writer.write_u32::<LittleEndian>(0)?;
        Ok(())
    }
}

/// Salt and key check value of a protected archive
///
/// Stored unencrypted right after the header so any later open with the
/// correct password reproduces the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionDescriptor {
    /// Per-archive random salt
    pub salt: [u8; SALT_SIZE],
    /// PBKDF2 iteration count
    pub iterations: u32,
    /// Known plaintext transformed under the derived key
    pub check: [u8; CHECK_SIZE],
}

impl EncryptionDescriptor {
    /// Create a descriptor with a fresh salt and return it with the derived key
    pub fn generate(password: &str, iterations: u32) -> (Self, PatchKey) {
        let salt = crypto::generate_salt();
        let key = crypto::derive_key(password, &salt, iterations);
        let descriptor = Self {
            salt,
            iterations,
            check: crypto::encryption_check(&key),
        };
        (descriptor, key)
    }

    /// Derive the key for `password` and verify it against the check value
    ///
    /// `patch` only names the archive in the error.
    pub fn unlock(&self, password: &str, patch: &str) -> Result<PatchKey> {
        let key = crypto::derive_key(password, &self.salt, self.iterations);
        if crypto::check_key(&key, &self.check) {
            Ok(key)
        } else {
            Err(Error::InvalidPassword(patch.to_string()))
        }
    }

    /// Read a descriptor
    pub fn read<R: Read>(reader: &mut R, limits: &SecurityLimits) -> Result<Self> {
        let mut salt = [0u8; SALT_SIZE];
        reader.read_exact(&mut salt).map_err(truncated)?;
        let iterations = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        limits.validate_kdf_iterations(iterations)?;
        let mut check = [0u8; CHECK_SIZE];
        reader.read_exact(&mut check).map_err(truncated)?;

        Ok(Self {
            salt,
            iterations,
            check,
        })
    }

    /// Write the descriptor
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.salt)?;
        writer.write_u32::<LittleEndian>(self.iterations)?;
        writer.write_all(&self.check)?;
        Ok(())
    }
}

fn truncated(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::invalid_format("Truncated patch header")
    } else {
        Error::Io(err)
    }
}
