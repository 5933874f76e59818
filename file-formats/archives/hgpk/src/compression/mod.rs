//! Compression and decompression of patch entries
//!
//! Only the deflate family is used: media that is already compressed (voice,
//! music, video) is stored as-is and everything else goes through zlib.

mod methods;
mod zlib;

pub use methods::CompressionMethod;

use crate::{Error, Result};

/// Compress data using the requested method
///
/// Returns the method actually applied together with the stored bytes. When
/// zlib does not make the data smaller the entry falls back to
/// [`CompressionMethod::None`], so callers must record the returned method
/// rather than the requested one.
pub fn compress(data: &[u8], method: CompressionMethod) -> Result<(CompressionMethod, Vec<u8>)> {
    match method {
        CompressionMethod::None => Ok((CompressionMethod::None, data.to_vec())),
        CompressionMethod::Zlib => {
            let compressed = zlib::compress(data)?;
            if compressed.len() >= data.len() {
                log::debug!(
                    "Compression not beneficial ({} -> {} bytes), storing uncompressed",
                    data.len(),
                    compressed.len()
                );
                Ok((CompressionMethod::None, data.to_vec()))
            } else {
                Ok((CompressionMethod::Zlib, compressed))
            }
        }
    }
}

/// Decompress an entry's stored bytes
///
/// `expected_size` comes from the table of contents; output that disagrees
/// with it is reported as corruption of `path`.
pub fn decompress(
    data: &[u8],
    method: CompressionMethod,
    expected_size: u64,
    path: &str,
) -> Result<Vec<u8>> {
    let decompressed = match method {
        CompressionMethod::None => data.to_vec(),
        CompressionMethod::Zlib => zlib::decompress(data, expected_size, path)?,
    };

    if decompressed.len() as u64 != expected_size {
        return Err(Error::InvalidFileSize {
            path: path.to_string(),
            expected: expected_size,
            actual: decompressed.len() as u64,
        });
    }

    Ok(decompressed)
}
