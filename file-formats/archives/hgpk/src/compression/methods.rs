//! Compression method definitions

use std::fmt;

/// Compression applied to a single stored entry
///
/// The discriminant is the tag written into the table of contents.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Stored as-is
    None = 0,
    /// Deflate with zlib framing
    Zlib = 1,
}

impl CompressionMethod {
    /// Tag written into the table of contents
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a tag read from the table of contents
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(CompressionMethod::None),
            1 => Some(CompressionMethod::Zlib),
            _ => None,
        }
    }

    /// Whether this method transforms the payload
    pub fn is_compressed(self) -> bool {
        self != CompressionMethod::None
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMethod::None => f.write_str("none"),
            CompressionMethod::Zlib => f.write_str("zlib"),
        }
    }
}
