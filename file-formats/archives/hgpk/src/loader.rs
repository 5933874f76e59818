//! Random-access reader for a single patch
//!
//! Opening parses only the header and table of contents. Every
//! [`PatchLoader::read`] then reads one entry's byte range with a positional
//! read, so a loader can be shared across threads once it is open.

use crate::codec::{self, PatchLayout};
use crate::crypto::PatchKey;
use crate::header::PatchHeader;
use crate::io::read_range;
use crate::path::{normalize_patch_path, patch_path_to_system};
use crate::security::SecurityLimits;
use crate::toc::{Entry, PatchInfo, PatchMetadata};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Options for opening a patch
///
/// # Examples
///
/// ```no_run
/// use hgpk::OpenOptions;
///
/// let loader = OpenOptions::new()
///     .password("hunter2")
///     .open("data/patch2.hgp")?;
/// # Ok::<(), hgpk::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    password: Option<String>,
    limits: SecurityLimits,
}

impl OpenOptions {
    /// Create default options (no password, default limits)
    pub fn new() -> Self {
        Self::default()
    }

    /// Password used to unlock an encrypted patch
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Password from an optional value
    pub fn password_opt(mut self, password: Option<&str>) -> Self {
        self.password = password.map(str::to_string);
        self
    }

    /// Parsing limits
    pub fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Open a patch with these options
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<PatchLoader> {
        PatchLoader::open_with_options(path, self)
    }
}

/// Outcome of [`PatchLoader::verify`]
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Entries that decoded and matched their checksum
    pub verified: usize,
    /// Entries that failed, with the error each produced
    pub failures: Vec<(String, Error)>,
}

impl VerifyReport {
    /// Whether every entry verified
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An open patch archive
///
/// The file handle is owned exclusively and closed when the loader drops,
/// including when opening fails part way.
#[derive(Debug)]
pub struct PatchLoader {
    path: PathBuf,
    file: File,
    layout: PatchLayout,
    key: Option<PatchKey>,
}

impl PatchLoader {
    /// Open an unprotected patch, or an encrypted one for listing only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, OpenOptions::default())
    }

    /// Open a patch with an optional password
    pub fn open_with_password<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self> {
        Self::open_with_options(path, OpenOptions::new().password_opt(password))
    }

    /// Open a patch with specific options
    ///
    /// A wrong password fails here with [`Error::InvalidPassword`], before any
    /// entry is read. An encrypted patch opened without a password stays
    /// listable; reads then fail with [`Error::PasswordRequired`].
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        let layout = {
            let mut reader = BufReader::new(&file);
            codec::read_layout(&mut reader, &options.limits)?
        };

        let name = &layout.toc.metadata().name;
        let key = match (&layout.encryption, options.password.as_deref()) {
            (Some(descriptor), Some(password)) => Some(descriptor.unlock(password, name)?),
            (Some(_), None) => {
                log::debug!("Opened encrypted patch {name} without a password, reads are locked");
                None
            }
            (None, Some(_)) => {
                log::debug!("Patch {name} is not encrypted, ignoring password");
                None
            }
            (None, None) => None,
        };

        log::debug!(
            "Opened patch {} from {} ({} entries)",
            name,
            path.display(),
            layout.toc.len()
        );

        Ok(Self {
            path,
            file,
            layout,
            key,
        })
    }

    /// Filesystem path the patch was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Patch name from the embedded metadata
    pub fn name(&self) -> &str {
        &self.layout.toc.metadata().name
    }

    /// Embedded metadata
    pub fn metadata(&self) -> &PatchMetadata {
        self.layout.toc.metadata()
    }

    /// Parsed header
    pub fn header(&self) -> &PatchHeader {
        &self.layout.header
    }

    /// Whether payloads are encrypted
    pub fn is_encrypted(&self) -> bool {
        self.layout.header.is_encrypted()
    }

    /// Whether the patch is encrypted and was opened without a password
    pub fn is_locked(&self) -> bool {
        self.is_encrypted() && self.key.is_none()
    }

    /// Fail with an authentication error if reads are locked
    pub fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            Err(Error::PasswordRequired(self.name().to_string()))
        } else {
            Ok(())
        }
    }

    /// Archive paths in stored order
    pub fn list_files(&self) -> Vec<&str> {
        self.layout
            .toc
            .entries()
            .iter()
            .map(|e| e.path.as_str())
            .collect()
    }

    /// All entries in stored order
    pub fn entries(&self) -> &[Entry] {
        self.layout.toc.entries()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.layout.toc.len()
    }

    /// Whether the patch holds no entries
    pub fn is_empty(&self) -> bool {
        self.layout.toc.is_empty()
    }

    /// Look up an entry; the path is normalized first
    pub fn entry(&self, path: &str) -> Option<&Entry> {
        let normalized = normalize_patch_path(path).ok()?;
        self.layout.toc.get(&normalized)
    }

    /// Whether the patch contains `path`
    pub fn contains(&self, path: &str) -> bool {
        self.entry(path).is_some()
    }

    /// Read and verify one file
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let normalized = normalize_patch_path(path)?;
        let entry = self
            .layout
            .toc
            .get(&normalized)
            .ok_or(Error::FileNotFound(normalized))?;
        self.read_entry(entry)
    }

    /// Read and verify one entry of this patch
    pub fn read_entry(&self, entry: &Entry) -> Result<Vec<u8>> {
        self.ensure_unlocked()?;
        log::trace!(
            "Reading {} from {} at 0x{:X} ({} bytes)",
            entry.path,
            self.name(),
            entry.offset,
            entry.stored_size
        );

        let stored = read_range(&self.file, entry.offset, entry.stored_size)?;
        self.layout.unpack_entry(entry, stored, self.key.as_ref())
    }

    /// Extract one file to `destination`, creating parent directories
    pub fn extract<P: AsRef<Path>>(&self, path: &str, destination: P) -> Result<u64> {
        let data = self.read(path)?;
        let destination = destination.as_ref();
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, &data)?;
        Ok(data.len() as u64)
    }

    /// Extract every file under `output_dir`, returning the number written
    pub fn extract_all<P: AsRef<Path>>(&self, output_dir: P) -> Result<usize> {
        self.ensure_unlocked()?;
        let output_dir = output_dir.as_ref();

        for entry in self.entries() {
            let data = self.read_entry(entry)?;
            let destination = output_dir.join(patch_path_to_system(&entry.path));
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&destination, &data)?;
        }

        log::info!(
            "Extracted {} files from {} to {}",
            self.len(),
            self.name(),
            output_dir.display()
        );
        Ok(self.len())
    }

    /// Decode every entry and collect the ones that fail
    pub fn verify(&self) -> Result<VerifyReport> {
        self.ensure_unlocked()?;

        let mut report = VerifyReport::default();
        for entry in self.entries() {
            match self.read_entry(entry) {
                Ok(_) => report.verified += 1,
                Err(Error::Io(e)) => return Err(Error::Io(e)),
                Err(e) => {
                    log::warn!("Entry {} in {} failed verification: {e}", entry.path, self.name());
                    report.failures.push((entry.path.clone(), e));
                }
            }
        }

        Ok(report)
    }

    /// Summary of the patch
    pub fn info(&self) -> PatchInfo {
        PatchInfo::from_toc(&self.layout.toc, self.is_encrypted())
    }
}
