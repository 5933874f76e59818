//! Offset-addressed keystream and key check value

use super::kdf::PatchKey;
use sha2::{Digest, Sha256};

/// Size of the key check value stored in the header
pub const CHECK_SIZE: usize = 32;

const BLOCK_SIZE: u64 = 32;
const STREAM_DOMAIN: &[u8] = b"hgpk-stream";
const CHECK_DOMAIN: &[u8] = b"hgpk-check";
const CHECK_PLAINTEXT: &[u8; CHECK_SIZE] = b"HGPK/key-check/v1\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";

fn keystream_block(key: &PatchKey, index: u64) -> [u8; BLOCK_SIZE as usize] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(STREAM_DOMAIN);
    hasher.update(index.to_le_bytes());

    let mut block = [0u8; BLOCK_SIZE as usize];
    block.copy_from_slice(&hasher.finalize());
    block
}

/// XOR `data` with the keystream starting at absolute file offset `offset`
///
/// The operation is its own inverse. Because each keystream block depends
/// only on the key and its index, any byte range of any entry can be
/// decrypted without touching the bytes before it.
pub fn transform(key: &PatchKey, offset: u64, data: &mut [u8]) {
    let mut position = offset;
    let mut remaining = data;

    while !remaining.is_empty() {
        let block = keystream_block(key, position / BLOCK_SIZE);
        let start = (position % BLOCK_SIZE) as usize;
        let take = (block.len() - start).min(remaining.len());

        let (chunk, rest) = remaining.split_at_mut(take);
        for (byte, k) in chunk.iter_mut().zip(&block[start..start + take]) {
            *byte ^= k;
        }

        position += take as u64;
        remaining = rest;
    }
}

/// Compute the check value stored in a protected archive's header
pub fn encryption_check(key: &PatchKey) -> [u8; CHECK_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(CHECK_DOMAIN);
    let pad = hasher.finalize();

    let mut check = *CHECK_PLAINTEXT;
    for (byte, k) in check.iter_mut().zip(pad.iter()) {
        *byte ^= k;
    }
    check
}

/// Verify a derived key against a stored check value
pub fn check_key(key: &PatchKey, check_value: &[u8]) -> bool {
    encryption_check(key).as_slice() == check_value
}
