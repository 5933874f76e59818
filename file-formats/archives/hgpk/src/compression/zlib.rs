//! Zlib compression and decompression

use crate::{Error, Result};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Compress using zlib/deflate
pub(super) fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::compression(format!("Zlib: {e}")))?;

    encoder
        .finish()
        .map_err(|e| Error::compression(format!("Zlib: {e}")))
}

/// Decompress using zlib/deflate
///
/// Output is capped one byte past `expected_size` so a hostile stream cannot
/// inflate without bound; the caller turns any size disagreement into a
/// corruption error.
pub(super) fn decompress(data: &[u8], expected_size: u64, path: &str) -> Result<Vec<u8>> {
    let capacity = usize::try_from(expected_size).unwrap_or(usize::MAX).min(1 << 24);
    let mut decompressed = Vec::with_capacity(capacity);
    let mut decoder = ZlibDecoder::new(data).take(expected_size.saturating_add(1));

    match decoder.read_to_end(&mut decompressed) {
        Ok(_) => Ok(decompressed),
        Err(e) => {
            log::debug!("Zlib decompression of {path} failed: {e}");
            log::trace!(
                "First 16 bytes of data: {:02X?}",
                &data[..16.min(data.len())]
            );
            Err(Error::corruption(path, format!("zlib stream invalid: {e}")))
        }
    }
}
