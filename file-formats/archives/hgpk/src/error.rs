//! Error types for the patch archive library

use std::io;
use thiserror::Error;

/// Result type alias for patch archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad error categories callers branch on
///
/// Every [`Error`] variant belongs to exactly one category; see [`Error::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or unsupported header, malformed table of contents
    Format,
    /// Checksum mismatch or undecodable payload
    Corruption,
    /// Missing or incorrect password for a protected archive
    Authentication,
    /// Path absent from one archive
    NotFound,
    /// Every resolver candidate was exhausted
    AssetNotFound,
    /// Duplicate archive path at build time
    Conflict,
    /// Operating system I/O failure
    Io,
    /// Invalid caller input (manifest, paths, build settings)
    Invalid,
}

/// Main error type for patch archive operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid patch format
    #[error("Invalid patch format: {0}")]
    InvalidFormat(String),

    /// Unsupported patch format version
    #[error("Unsupported patch format version: {0}")]
    UnsupportedVersion(u16),

    /// Payload or table of contents failed to decode
    #[error("Corrupted data in {path}: {reason}")]
    Corruption {
        /// Entry path or table name
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Content checksum mismatch after decoding an entry
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Entry path
        path: String,
        /// Hex digest recorded in the table of contents
        expected: String,
        /// Hex digest of the decoded bytes
        actual: String,
    },

    /// Decoded entry length disagrees with the table of contents
    #[error("Invalid size for {path}: expected {expected}, got {actual}")]
    InvalidFileSize {
        /// Entry path
        path: String,
        /// Size recorded in the table of contents
        expected: u64,
        /// Size actually produced
        actual: u64,
    },

    /// Archive is encrypted but no password was supplied
    #[error("Patch {0} is encrypted and no password was provided")]
    PasswordRequired(String),

    /// Supplied password does not match the stored check value
    #[error("Invalid password for patch {0}")]
    InvalidPassword(String),

    /// File not found in one archive
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Resolution chain exhausted without a match
    #[error("Asset not found: {reference} (namespace: {})", namespace.as_deref().unwrap_or("<none>"))]
    AssetNotFound {
        /// The reference exactly as the script wrote it
        reference: String,
        /// Namespace the lookup ran under
        namespace: Option<String>,
    },

    /// Two sources map to the same archive path
    #[error("Duplicate archive path: {0}")]
    Conflict(String),

    /// Archive path cannot be normalized
    #[error("Invalid archive path: {0}")]
    InvalidPath(String),

    /// Compression failed while building
    #[error("Compression error: {0}")]
    Compression(String),

    /// Manifest or actor map could not be parsed or written
    #[error("Manifest error: {0}")]
    Manifest(String),
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Create a new Corruption error
    pub fn corruption<P: Into<String>, S: Into<String>>(path: P, reason: S) -> Self {
        Error::Corruption {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Compression error
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Error::Compression(msg.into())
    }

    /// Create a new Manifest error
    pub fn manifest<S: Into<String>>(msg: S) -> Self {
        Error::Manifest(msg.into())
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidFormat(_) | Error::UnsupportedVersion(_) => ErrorKind::Format,
            Error::Corruption { .. }
            | Error::ChecksumMismatch { .. }
            | Error::InvalidFileSize { .. } => ErrorKind::Corruption,
            Error::PasswordRequired(_) | Error::InvalidPassword(_) => ErrorKind::Authentication,
            Error::FileNotFound(_) => ErrorKind::NotFound,
            Error::AssetNotFound { .. } => ErrorKind::AssetNotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::InvalidPath(_) | Error::Compression(_) | Error::Manifest(_) => {
                ErrorKind::Invalid
            }
        }
    }

    /// Check if this error indicates the archive is corrupted
    pub fn is_corruption(&self) -> bool {
        self.kind() == ErrorKind::Corruption
    }

    /// Check if this error is a password problem
    pub fn is_authentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Check if this error is recoverable
    ///
    /// A missing path lets overlay lookups advance to the next patch; a
    /// failed authentication lets a non-strict registry skip the patch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::Authentication
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Manifest(err.to_string())
    }
}
