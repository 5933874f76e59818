//! Table of contents: patch metadata and the entry list
//!
//! The table sits at the end of the archive, is never encrypted and is
//! guarded by a CRC32 stored in the header. It is parsed once at open time
//! into an [`TableOfContents`] with an O(1) path index.

use crate::compression::CompressionMethod;
use crate::patch_type::PatchType;
use crate::security::SecurityLimits;
use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

/// Name used in corruption errors raised for the table itself
const TOC_NAME: &str = "(table of contents)";

/// Provenance metadata embedded in every patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMetadata {
    /// Patch name (also the key for passwords and manifests)
    pub name: String,
    /// Content category
    pub patch_type: PatchType,
    /// Declared version
    pub version: String,
    /// Author or publisher
    pub author: String,
    /// Free-form description
    pub description: String,
    /// Overlay priority used when no manifest ranks the patch
    pub priority: i32,
    /// Names of patches this one expects to be loaded alongside it
    pub requires: Vec<String>,
}

impl PatchMetadata {
    /// Create metadata with empty version, author and description, priority
    /// 0 and no requirements
    pub fn new(name: impl Into<String>, patch_type: PatchType) -> Self {
        Self {
            name: name.into(),
            patch_type,
            version: String::new(),
            author: String::new(),
            description: String::new(),
            priority: 0,
            requires: Vec::new(),
        }
    }
}

/// One packaged file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Normalized archive path
    pub path: String,
    /// Absolute offset of the stored payload
    pub offset: u64,
    /// Stored (compressed, possibly encrypted) length
    pub stored_size: u64,
    /// Uncompressed length
    pub size: u64,
    /// Compression applied to the payload
    pub compression: CompressionMethod,
    /// CRC32 of the stored bytes exactly as written
    pub stored_crc32: u32,
    /// MD5 of the uncompressed content
    pub md5: [u8; 16],
}

impl Entry {
    /// Hex form of the content checksum
    pub fn checksum_hex(&self) -> String {
        hex::encode(self.md5)
    }

    /// Ratio of stored to uncompressed size (1.0 for empty entries)
    pub fn compression_ratio(&self) -> f64 {
        if self.size == 0 {
            1.0
        } else {
            self.stored_size as f64 / self.size as f64
        }
    }

    /// Verify stored bytes before decrypting or decompressing them
    ///
    /// Catches flips that a decoder would ignore, such as deflate padding bits.
    pub fn verify_stored(&self, stored: &[u8]) -> Result<()> {
        let actual = crc32fast::hash(stored);
        if actual != self.stored_crc32 {
            return Err(Error::corruption(
                &self.path,
                format!(
                    "stored CRC32 mismatch: expected {:08x}, got {actual:08x}",
                    self.stored_crc32
                ),
            ));
        }
        Ok(())
    }

    /// Verify decoded content against the recorded size and checksum
    pub fn verify_content(&self, data: &[u8]) -> Result<()> {
        if data.len() as u64 != self.size {
            return Err(Error::InvalidFileSize {
                path: self.path.clone(),
                expected: self.size,
                actual: data.len() as u64,
            });
        }

        let actual = content_checksum(data);
        if actual != self.md5 {
            return Err(Error::ChecksumMismatch {
                path: self.path.clone(),
                expected: self.checksum_hex(),
                actual: hex::encode(actual),
            });
        }

        Ok(())
    }
}

/// MD5 of uncompressed content, as recorded per entry
pub fn content_checksum(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Parsed table of contents
#[derive(Debug, Clone)]
pub struct TableOfContents {
    metadata: PatchMetadata,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl TableOfContents {
    /// Create a table from metadata and entries
    ///
    /// Fails with a conflict when two entries share a path.
    pub fn new(metadata: PatchMetadata, entries: Vec<Entry>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.path.clone(), position).is_some() {
                return Err(Error::Conflict(entry.path.clone()));
            }
        }

        Ok(Self {
            metadata,
            entries,
            index,
        })
    }

    /// Embedded patch metadata
    pub fn metadata(&self) -> &PatchMetadata {
        &self.metadata
    }

    /// Entries in archive order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up an entry by normalized path
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the table
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_string(&mut out, &self.metadata.name)?;
        out.write_u8(self.metadata.patch_type.tag())?;
        write_string(&mut out, &self.metadata.version)?;
        write_string(&mut out, &self.metadata.author)?;
        write_string(&mut out, &self.metadata.description)?;
        out.write_i32::<LittleEndian>(self.metadata.priority)?;
        let requires = u16::try_from(self.metadata.requires.len())
            .map_err(|_| Error::invalid_format("Too many required patches"))?;
        out.write_u16::<LittleEndian>(requires)?;
        for name in &self.metadata.requires {
            write_string(&mut out, name)?;
        }

        let count = u32::try_from(self.entries.len())
            .map_err(|_| Error::invalid_format("Too many entries for one patch"))?;
        out.write_u32::<LittleEndian>(count)?;

        for entry in &self.entries {
            write_string(&mut out, &entry.path)?;
            out.write_u64::<LittleEndian>(entry.offset)?;
            out.write_u64::<LittleEndian>(entry.stored_size)?;
            out.write_u64::<LittleEndian>(entry.size)?;
            out.write_u8(entry.compression.tag())?;
            out.write_u32::<LittleEndian>(entry.stored_crc32)?;
            out.write_all(&entry.md5)?;
        }

        Ok(out)
    }

    /// Parse a table, validating every entry against the payload region
    ///
    /// `payload` is the half-open byte range between the end of the header
    /// and the start of the table.
    pub fn decode(
        bytes: &[u8],
        payload: std::ops::Range<u64>,
        limits: &SecurityLimits,
    ) -> Result<Self> {
        let mut reader = Cursor::new(bytes);

        let name = read_string(&mut reader)?;
        let type_tag = reader.read_u8().map_err(truncated)?;
        let patch_type = PatchType::from_tag(type_tag)
            .ok_or_else(|| Error::invalid_format(format!("Unknown patch type tag: {type_tag}")))?;
        let version = read_string(&mut reader)?;
        let author = read_string(&mut reader)?;
        let description = read_string(&mut reader)?;
        let priority = reader.read_i32::<LittleEndian>().map_err(truncated)?;
        let requires_count = reader.read_u16::<LittleEndian>().map_err(truncated)?;
        let requires = (0..requires_count)
            .map(|_| read_string(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        let count = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        limits.validate_entry_count(count)?;

        // Each entry needs at least 47 bytes, which bounds the allocation
        let remaining = bytes.len() as u64 - reader.position();
        let capacity = (count as u64).min(remaining / 47) as usize;
        let mut entries = Vec::with_capacity(capacity);

        for _ in 0..count {
            let path = read_string(&mut reader)?;
            limits.validate_path_length(path.len())?;
            if crate::path::normalize_patch_path(&path).ok().as_deref() != Some(path.as_str()) {
                return Err(Error::invalid_format(format!(
                    "Entry path is not normalized: {path:?}"
                )));
            }

            let offset = reader.read_u64::<LittleEndian>().map_err(truncated)?;
            let stored_size = reader.read_u64::<LittleEndian>().map_err(truncated)?;
            let size = reader.read_u64::<LittleEndian>().map_err(truncated)?;
            let compression_tag = reader.read_u8().map_err(truncated)?;
            let compression = CompressionMethod::from_tag(compression_tag).ok_or_else(|| {
                Error::invalid_format(format!(
                    "Unknown compression tag {compression_tag} for {path}"
                ))
            })?;
            let stored_crc32 = reader.read_u32::<LittleEndian>().map_err(truncated)?;
            let mut md5 = [0u8; 16];
            reader.read_exact(&mut md5).map_err(truncated)?;

            let end = offset.checked_add(stored_size);
            if offset < payload.start || end.is_none_or(|end| end > payload.end) {
                return Err(Error::invalid_format(format!(
                    "Entry {path} lies outside the payload region"
                )));
            }
            limits.validate_entry_size(&path, size)?;
            if compression == CompressionMethod::None && stored_size != size {
                return Err(Error::invalid_format(format!(
                    "Stored entry {path} has mismatched sizes"
                )));
            }

            entries.push(Entry {
                path,
                offset,
                stored_size,
                size,
                compression,
                stored_crc32,
                md5,
            });
        }

        if reader.position() != bytes.len() as u64 {
            return Err(Error::invalid_format("Trailing bytes after table of contents"));
        }

        let metadata = PatchMetadata {
            name,
            patch_type,
            version,
            author,
            description,
            priority,
            requires,
        };

        Self::new(metadata, entries).map_err(|err| match err {
            Error::Conflict(path) => {
                Error::invalid_format(format!("Duplicate entry in table of contents: {path}"))
            }
            other => other,
        })
    }
}

/// Summary of a built or opened patch
#[derive(Debug, Clone)]
pub struct PatchInfo {
    /// Embedded metadata
    pub metadata: PatchMetadata,
    /// Whether payloads are encrypted
    pub encrypted: bool,
    /// Number of entries
    pub total_files: usize,
    /// Sum of uncompressed entry sizes
    pub total_size: u64,
    /// Sum of stored entry sizes
    pub stored_size: u64,
    /// Entries in archive order
    pub entries: Vec<Entry>,
}

impl PatchInfo {
    /// Summarize a table of contents
    pub fn from_toc(toc: &TableOfContents, encrypted: bool) -> Self {
        Self {
            metadata: toc.metadata().clone(),
            encrypted,
            total_files: toc.len(),
            total_size: toc.entries().iter().map(|e| e.size).sum(),
            stored_size: toc.entries().iter().map(|e| e.stored_size).sum(),
            entries: toc.entries().to_vec(),
        }
    }

    /// Overall stored/uncompressed ratio
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.stored_size as f64 / self.total_size as f64
        }
    }
}

/// CRC32 guarding the table bytes
pub fn toc_checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Verify the table bytes against the header's CRC32
pub fn verify_toc_checksum(bytes: &[u8], expected: u32) -> Result<()> {
    let actual = toc_checksum(bytes);
    if actual != expected {
        return Err(Error::corruption(
            TOC_NAME,
            format!("CRC32 mismatch: expected {expected:08x}, got {actual:08x}"),
        ));
    }
    Ok(())
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let len = u16::try_from(value.len())
        .map_err(|_| Error::invalid_format(format!("String too long for table: {value:.32}...")))?;
    writer.write_u16::<LittleEndian>(len)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<LittleEndian>().map_err(truncated)? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(truncated)?;
    String::from_utf8(buf).map_err(|_| Error::invalid_format("String in table is not UTF-8"))
}

fn truncated(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::invalid_format("Truncated table of contents")
    } else {
        Error::Io(err)
    }
}
