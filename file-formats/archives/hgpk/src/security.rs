//! Limits applied while parsing untrusted patch archives
//!
//! Header and table-of-contents fields are validated against these limits
//! before anything is allocated, so a hostile or truncated archive fails with
//! a format error instead of exhausting memory.

use crate::{Error, Result};

/// Security limits for patch archive parsing
#[derive(Debug, Clone)]
pub struct SecurityLimits {
    /// Maximum table-of-contents size in bytes (default: 64MB)
    pub max_toc_size: u64,
    /// Maximum number of entries in one archive (default: 1M)
    pub max_entries: u32,
    /// Maximum archive path length in bytes (default: 1024)
    pub max_path_length: usize,
    /// Maximum uncompressed size of a single entry (default: 4GB)
    pub max_entry_size: u64,
    /// Maximum PBKDF2 iteration count a header may request
    pub max_kdf_iterations: u32,
}

impl Default for SecurityLimits {
    fn default() -> Self {
        Self {
            max_toc_size: 64 * 1024 * 1024,
            max_entries: 1_000_000,
            max_path_length: 1024,
            max_entry_size: 4 * 1024 * 1024 * 1024,
            max_kdf_iterations: crate::crypto::MAX_KDF_ITERATIONS,
        }
    }
}

impl SecurityLimits {
    /// Validate the table-of-contents location recorded in a header
    pub fn validate_toc_location(
        &self,
        toc_offset: u64,
        toc_size: u64,
        data_start: u64,
        archive_size: u64,
    ) -> Result<()> {
        if toc_size > self.max_toc_size {
            return Err(Error::invalid_format(format!(
                "Table of contents too large: {toc_size} bytes (limit {})",
                self.max_toc_size
            )));
        }

        let toc_end = toc_offset
            .checked_add(toc_size)
            .ok_or_else(|| Error::invalid_format("Table of contents offset overflows"))?;

        if toc_offset < data_start || toc_end > archive_size {
            return Err(Error::invalid_format(format!(
                "Table of contents at {toc_offset}..{toc_end} lies outside the archive ({archive_size} bytes)"
            )));
        }

        Ok(())
    }

    /// Validate an entry count read from the table of contents
    pub fn validate_entry_count(&self, count: u32) -> Result<()> {
        if count > self.max_entries {
            return Err(Error::invalid_format(format!(
                "Too many entries: {count} (limit {})",
                self.max_entries
            )));
        }
        Ok(())
    }

    /// Validate a path length read from the table of contents
    pub fn validate_path_length(&self, len: usize) -> Result<()> {
        if len > self.max_path_length {
            return Err(Error::invalid_format(format!(
                "Entry path too long: {len} bytes (limit {})",
                self.max_path_length
            )));
        }
        Ok(())
    }

    /// Validate an entry's recorded uncompressed size
    pub fn validate_entry_size(&self, path: &str, size: u64) -> Result<()> {
        if size > self.max_entry_size {
            return Err(Error::invalid_format(format!(
                "Entry {path} too large: {size} bytes (limit {})",
                self.max_entry_size
            )));
        }
        Ok(())
    }

    /// Validate the key-derivation cost requested by a header
    pub fn validate_kdf_iterations(&self, iterations: u32) -> Result<()> {
        if iterations == 0 || iterations > self.max_kdf_iterations {
            return Err(Error::invalid_format(format!(
                "Unsupported key derivation iteration count: {iterations}"
            )));
        }
        Ok(())
    }
}
