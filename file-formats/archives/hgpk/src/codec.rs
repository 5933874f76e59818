//! Archive codec: whole-file layout of a patch
//!
//! A patch is written front to back by [`PatchWriter`]: a placeholder header,
//! the optional encryption descriptor, every payload back to back, and finally
//! the table of contents. The header is then rewritten with the table's
//! location and checksum. Reading goes the other way through
//! [`read_layout`], which parses the header and table without touching any
//! payload.

use crate::compression::{self, CompressionMethod};
use crate::crypto::{self, PatchKey};
use crate::header::{EncryptionDescriptor, FORMAT_VERSION, PatchHeader, flags};
use crate::path::normalize_patch_path;
use crate::security::SecurityLimits;
use crate::toc::{self, Entry, PatchMetadata, TableOfContents};
use crate::{Error, Result};
use std::collections::HashSet;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// Encryption state for writing or reading a protected patch
#[derive(Debug, Clone)]
pub struct Encryption {
    descriptor: EncryptionDescriptor,
    key: PatchKey,
}

impl Encryption {
    /// Fresh salt and key for a new archive
    pub fn new(password: &str, iterations: u32) -> Self {
        let (descriptor, key) = EncryptionDescriptor::generate(password, iterations);
        Self { descriptor, key }
    }

    /// Unlock an existing archive's descriptor
    pub fn unlock(descriptor: &EncryptionDescriptor, password: &str, patch: &str) -> Result<Self> {
        let key = descriptor.unlock(password, patch)?;
        Ok(Self {
            descriptor: descriptor.clone(),
            key,
        })
    }

    /// Descriptor stored after the header
    pub fn descriptor(&self) -> &EncryptionDescriptor {
        &self.descriptor
    }

    /// Derived payload key
    pub fn key(&self) -> &PatchKey {
        &self.key
    }
}

/// Streaming patch writer
///
/// Entries are written in the order they are added; callers that need
/// reproducible archives add them in a stable order.
#[derive(Debug)]
pub struct PatchWriter<W: Write + Seek> {
    writer: W,
    metadata: PatchMetadata,
    encryption: Option<Encryption>,
    entries: Vec<Entry>,
    seen: HashSet<String>,
    position: u64,
}

impl<W: Write + Seek> PatchWriter<W> {
    /// Start a patch at the beginning of `writer`
    pub fn new(
        mut writer: W,
        metadata: PatchMetadata,
        encryption: Option<Encryption>,
    ) -> Result<Self> {
        let header = Self::header_for(encryption.is_some(), 0, 0, 0);
        writer.seek(SeekFrom::Start(0))?;
        header.write(&mut writer)?;
        if let Some(encryption) = &encryption {
            encryption.descriptor.write(&mut writer)?;
        }

        Ok(Self {
            writer,
            metadata,
            encryption,
            entries: Vec::new(),
            seen: HashSet::new(),
            position: header.data_start(),
        })
    }

    fn header_for(encrypted: bool, toc_offset: u64, toc_size: u64, toc_crc32: u32) -> PatchHeader {
        PatchHeader {
            version: FORMAT_VERSION,
            flags: if encrypted { flags::ENCRYPTED } else { 0 },
            toc_offset,
            toc_size,
            toc_crc32,
        }
    }

    /// Compress, encrypt and append one entry
    ///
    /// The recorded compression is the method actually applied, which may be
    /// [`CompressionMethod::None`] when zlib does not help.
    pub fn add_entry(
        &mut self,
        path: &str,
        data: &[u8],
        compression: CompressionMethod,
    ) -> Result<&Entry> {
        let path = normalize_patch_path(path)?;
        if !self.seen.insert(path.clone()) {
            return Err(Error::Conflict(path));
        }

        let (applied, mut stored) = compression::compress(data, compression)?;
        if let Some(encryption) = &self.encryption {
            crypto::transform(&encryption.key, self.position, &mut stored);
        }
        self.writer.write_all(&stored)?;

        log::trace!(
            "Wrote {path} at 0x{:X}: {} -> {} bytes ({applied})",
            self.position,
            data.len(),
            stored.len()
        );

        self.entries.push(Entry {
            path,
            offset: self.position,
            stored_size: stored.len() as u64,
            size: data.len() as u64,
            compression: applied,
            stored_crc32: crc32fast::hash(&stored),
            md5: toc::content_checksum(data),
        });
        self.position += stored.len() as u64;

        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries were written yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the table of contents, patch the header and return the writer
    pub fn finish(mut self) -> Result<(W, TableOfContents)> {
        let toc = TableOfContents::new(self.metadata, self.entries)?;
        let toc_bytes = toc.encode()?;
        self.writer.write_all(&toc_bytes)?;

        let header = Self::header_for(
            self.encryption.is_some(),
            self.position,
            toc_bytes.len() as u64,
            toc::toc_checksum(&toc_bytes),
        );
        self.writer.seek(SeekFrom::Start(0))?;
        header.write(&mut self.writer)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()?;

        log::debug!(
            "Finished patch {} with {} entries, table at 0x{:X} ({} bytes)",
            toc.metadata().name,
            toc.len(),
            header.toc_offset,
            header.toc_size
        );

        Ok((self.writer, toc))
    }
}

/// Everything parsed from a patch at open time
#[derive(Debug, Clone)]
pub struct PatchLayout {
    /// Fixed header
    pub header: PatchHeader,
    /// Encryption descriptor, present only for protected patches
    pub encryption: Option<EncryptionDescriptor>,
    /// Table of contents
    pub toc: TableOfContents,
}

impl PatchLayout {
    /// Decode one entry from its stored bytes
    ///
    /// `key` must be the unlocked key when the patch is encrypted.
    pub fn unpack_entry(
        &self,
        entry: &Entry,
        mut stored: Vec<u8>,
        key: Option<&PatchKey>,
    ) -> Result<Vec<u8>> {
        entry.verify_stored(&stored)?;
        if self.header.is_encrypted() {
            let key =
                key.ok_or_else(|| Error::PasswordRequired(self.toc.metadata().name.clone()))?;
            crypto::transform(key, entry.offset, &mut stored);
        }

        let data = compression::decompress(&stored, entry.compression, entry.size, &entry.path)?;
        entry.verify_content(&data)?;
        Ok(data)
    }
}

/// Parse the header, optional descriptor and table of contents
///
/// Reads nothing past the header when the signature or version is wrong.
pub fn read_layout<R: Read + Seek>(reader: &mut R, limits: &SecurityLimits) -> Result<PatchLayout> {
    let archive_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let header = PatchHeader::read(reader)?;
    let encryption = if header.is_encrypted() {
        Some(EncryptionDescriptor::read(reader, limits)?)
    } else {
        None
    };

    let data_start = header.data_start();
    limits.validate_toc_location(header.toc_offset, header.toc_size, data_start, archive_size)?;

    let mut toc_bytes = vec![0u8; header.toc_size as usize];
    reader.seek(SeekFrom::Start(header.toc_offset))?;
    reader.read_exact(&mut toc_bytes)?;
    toc::verify_toc_checksum(&toc_bytes, header.toc_crc32)?;

    let toc = TableOfContents::decode(&toc_bytes, data_start..header.toc_offset, limits)?;

    log::debug!(
        "Parsed patch {} v{}: {} entries, encrypted: {}",
        toc.metadata().name,
        header.version,
        toc.len(),
        header.is_encrypted()
    );

    Ok(PatchLayout {
        header,
        encryption,
        toc,
    })
}

/// Encode a complete patch in memory
///
/// Each item is `(archive path, content, compression)`.
pub fn encode(
    metadata: PatchMetadata,
    files: &[(&str, &[u8], CompressionMethod)],
    encryption: Option<Encryption>,
) -> Result<Vec<u8>> {
    let mut writer = PatchWriter::new(Cursor::new(Vec::new()), metadata, encryption)?;
    for (path, data, compression) in files {
        writer.add_entry(path, data, *compression)?;
    }
    let (cursor, _) = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Decode the header and table of contents of an in-memory patch
pub fn decode_header(bytes: &[u8]) -> Result<PatchLayout> {
    read_layout(&mut Cursor::new(bytes), &SecurityLimits::default())
}

/// Decode one entry of an in-memory patch
pub fn decode_entry(
    bytes: &[u8],
    layout: &PatchLayout,
    entry: &Entry,
    key: Option<&PatchKey>,
) -> Result<Vec<u8>> {
    let range_error =
        || Error::invalid_format(format!("payload range of {} overflows", entry.path));
    let start = usize::try_from(entry.offset).map_err(|_| range_error())?;
    let end = usize::try_from(entry.stored_size)
        .ok()
        .and_then(|len| start.checked_add(len))
        .ok_or_else(range_error)?;
    let stored = bytes
        .get(start..end)
        .ok_or_else(|| Error::corruption(&entry.path, "payload range outside the archive"))?;
    layout.unpack_entry(entry, stored.to_vec(), key)
}
