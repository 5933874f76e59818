//! Patch builder for creating patch archives
//!
//! Sources are collected first and only resolved in [`PatchBuilder::build`]:
//! directories are walked, every archive path is normalized and checked for
//! duplicates, and the entries are sorted by path before anything is
//! written. The archive goes to a temporary file next to the destination and
//! is renamed into place only once it is complete.

use crate::codec::{Encryption, PatchWriter};
use crate::compression::CompressionMethod;
use crate::crypto::DEFAULT_KDF_ITERATIONS;
use crate::path::{join_patch_path, normalize_patch_path, relative_to_patch_path};
use crate::patch_type::PatchType;
use crate::toc::{PatchInfo, PatchMetadata};
use crate::{Error, Result};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Where one file's content comes from
#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Data(Vec<u8>),
}

/// A source registered with `add_*`, resolved at build time
#[derive(Debug)]
enum PendingSource {
    File {
        source: FileSource,
        archive_path: String,
        compression: Option<CompressionMethod>,
    },
    Directory {
        dir: PathBuf,
        prefix: String,
        compression: Option<CompressionMethod>,
    },
}

/// A file ready to be written
#[derive(Debug)]
struct PlannedEntry<'a> {
    archive_path: String,
    source: Cow<'a, FileSource>,
    compression: CompressionMethod,
}

/// Builder for creating patch archives
///
/// # Examples
///
/// ```no_run
/// use hgpk::{PatchBuilder, PatchType};
///
/// let info = PatchBuilder::new("patch1", PatchType::Graphics)
///     .add_directory("assets/backgrounds", "backgrounds")
///     .add_file("assets/ui/title.png", "ui/title.png")
///     .password("hunter2")
///     .build("dist/patch1.hgp", "1.0.0", "Base graphics")?;
///
/// println!("{} files packed", info.total_files);
/// # Ok::<(), hgpk::Error>(())
/// ```
#[derive(Debug)]
pub struct PatchBuilder {
    name: String,
    patch_type: PatchType,
    compression: CompressionMethod,
    password: Option<String>,
    kdf_iterations: u32,
    author: String,
    priority: i32,
    requires: Vec<String>,
    sources: Vec<PendingSource>,
}

impl PatchBuilder {
    /// Create a builder; compression defaults to the patch type's policy
    pub fn new(name: impl Into<String>, patch_type: PatchType) -> Self {
        Self {
            name: name.into(),
            patch_type,
            compression: patch_type.default_compression(),
            password: None,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            author: String::new(),
            priority: 0,
            requires: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Override the compression used for entries without their own override
    pub fn default_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self
    }

    /// Encrypt payloads with a key derived from `password`
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Encrypt payloads when a password is given
    pub fn password_opt(mut self, password: Option<&str>) -> Self {
        self.password = password.map(str::to_string);
        self
    }

    /// PBKDF2 iteration count for encrypted patches
    pub fn kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations.max(1);
        self
    }

    /// Author recorded in the patch metadata
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Priority embedded in the patch, used when a directory is scanned
    /// without a manifest
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Record a patch this one depends on
    pub fn requires(mut self, patch: impl Into<String>) -> Self {
        self.requires.push(patch.into());
        self
    }

    /// Add a file from disk
    pub fn add_file<P: AsRef<Path>>(mut self, source: P, archive_path: &str) -> Self {
        self.sources.push(PendingSource::File {
            source: FileSource::Path(source.as_ref().to_path_buf()),
            archive_path: archive_path.to_string(),
            compression: None,
        });
        self
    }

    /// Add a file from disk with explicit compression
    pub fn add_file_with_compression<P: AsRef<Path>>(
        mut self,
        source: P,
        archive_path: &str,
        compression: CompressionMethod,
    ) -> Self {
        self.sources.push(PendingSource::File {
            source: FileSource::Path(source.as_ref().to_path_buf()),
            archive_path: archive_path.to_string(),
            compression: Some(compression),
        });
        self
    }

    /// Add a file from memory
    pub fn add_file_data(mut self, data: Vec<u8>, archive_path: &str) -> Self {
        self.sources.push(PendingSource::File {
            source: FileSource::Data(data),
            archive_path: archive_path.to_string(),
            compression: None,
        });
        self
    }

    /// Add every file below `dir` under the archive prefix `prefix`
    ///
    /// An empty prefix places files at the archive root.
    pub fn add_directory<P: AsRef<Path>>(mut self, dir: P, prefix: &str) -> Self {
        self.sources.push(PendingSource::Directory {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            compression: None,
        });
        self
    }

    /// Add a directory with its own compression override
    pub fn add_directory_with_compression<P: AsRef<Path>>(
        mut self,
        dir: P,
        prefix: &str,
        compression: CompressionMethod,
    ) -> Self {
        self.sources.push(PendingSource::Directory {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            compression: Some(compression),
        });
        self
    }

    /// Patch name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Patch type
    pub fn patch_type(&self) -> PatchType {
        self.patch_type
    }

    /// Archive paths that `build` would write, in write order
    ///
    /// Walks every added directory and reports duplicates exactly as `build`
    /// does.
    pub fn archive_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .plan()?
            .into_iter()
            .map(|entry| entry.archive_path)
            .collect())
    }

    /// Resolve every source into a sorted, duplicate-free entry list
    fn plan(&self) -> Result<Vec<PlannedEntry<'_>>> {
        let mut planned = Vec::new();

        for source in &self.sources {
            match source {
                PendingSource::File {
                    source,
                    archive_path,
                    compression,
                } => planned.push(PlannedEntry {
                    archive_path: normalize_patch_path(archive_path)?,
                    source: Cow::Borrowed(source),
                    compression: compression.unwrap_or(self.compression),
                }),
                PendingSource::Directory {
                    dir,
                    prefix,
                    compression,
                } => {
                    let compression = compression.unwrap_or(self.compression);
                    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
                        let entry = entry.map_err(std::io::Error::from)?;
                        if !entry.file_type().is_file() {
                            continue;
                        }

                        let relative = entry.path().strip_prefix(dir).map_err(|_| {
                            Error::InvalidPath(entry.path().display().to_string())
                        })?;
                        let relative = relative_to_patch_path(relative)?;
                        planned.push(PlannedEntry {
                            archive_path: join_patch_path(prefix, &relative)?,
                            source: Cow::Owned(FileSource::Path(entry.into_path())),
                            compression,
                        });
                    }
                }
            }
        }

        {
            let mut seen = HashSet::with_capacity(planned.len());
            for entry in &planned {
                if !seen.insert(entry.archive_path.as_str()) {
                    return Err(Error::Conflict(entry.archive_path.clone()));
                }
            }
        }

        planned.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));
        Ok(planned)
    }

    /// Build the patch and write it to `output`
    ///
    /// Nothing is written when planning fails (duplicate paths, unreadable
    /// directories); a failure while writing leaves no partial archive behind.
    pub fn build<P: AsRef<Path>>(
        self,
        output: P,
        version: &str,
        description: &str,
    ) -> Result<PatchInfo> {
        let output = output.as_ref();
        let planned = self.plan()?;

        log::debug!(
            "Building {} patch {} with {} entries (default compression {}, encrypted: {})",
            self.patch_type,
            self.name,
            planned.len(),
            self.compression,
            self.password.is_some()
        );

        let parent = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Create a temporary file in the same directory
        let mut temp_file = NamedTempFile::new_in(parent)?;

        let metadata = PatchMetadata {
            name: self.name.clone(),
            patch_type: self.patch_type,
            version: version.to_string(),
            author: self.author.clone(),
            description: description.to_string(),
            priority: self.priority,
            requires: self.requires.clone(),
        };
        let encryption = self
            .password
            .as_deref()
            .map(|password| Encryption::new(password, self.kdf_iterations));

        let toc = {
            let file = temp_file.as_file_mut();
            let mut writer = PatchWriter::new(BufWriter::new(file), metadata, encryption)?;

            for entry in &planned {
                let data: Cow<'_, [u8]> = match &*entry.source {
                    FileSource::Path(path) => Cow::Owned(fs::read(path)?),
                    FileSource::Data(data) => Cow::Borrowed(data.as_slice()),
                };
                writer.add_entry(&entry.archive_path, &data, entry.compression)?;
            }

            let (buffered, toc) = writer.finish()?;
            buffered
                .into_inner()
                .map_err(|e| Error::Io(e.into_error()))?
                .sync_all()?;
            toc
        };

        // Atomically rename temp file to final destination
        temp_file.persist(output).map_err(|e| Error::Io(e.error))?;

        let info = PatchInfo::from_toc(&toc, self.password.is_some());
        log::info!(
            "Built {} ({} files, {} -> {} bytes)",
            output.display(),
            info.total_files,
            info.total_size,
            info.stored_size
        );

        Ok(info)
    }
}
