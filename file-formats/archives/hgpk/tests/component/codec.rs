//! In-memory archive codec behaviour

use hgpk::header::{HEADER_SIZE, flags};
use hgpk::{
    CompressionMethod, Encryption, Error, ErrorKind, PatchMetadata, PatchType, decode_entry,
    decode_header, encode,
};
use pretty_assertions::assert_eq;

fn sample(encryption: Option<Encryption>) -> Vec<u8> {
    let script = "label start:\n    alice \"Hi\"\n".repeat(40);
    encode(
        PatchMetadata::new("sample", PatchType::Script),
        &[
            ("scripts/demo.vns", script.as_bytes(), CompressionMethod::Zlib),
            ("bg/park.png", &b"\x89PNG"[..], CompressionMethod::None),
        ],
        encryption,
    )
    .unwrap()
}

#[test]
fn test_unencrypted_has_no_descriptor() {
    let bytes = sample(None);
    let layout = decode_header(&bytes).unwrap();

    assert_eq!(layout.header.flags & flags::ENCRYPTED, 0);
    assert!(layout.encryption.is_none());
    // Payloads start right after the fixed header
    assert_eq!(layout.toc.entries()[0].offset, HEADER_SIZE);
}

#[test]
fn test_encrypted_listing_needs_no_password() {
    let bytes = sample(Some(Encryption::new("pw", 16)));
    let layout = decode_header(&bytes).unwrap();

    assert!(layout.header.is_encrypted());
    let paths: Vec<_> = layout.toc.entries().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["scripts/demo.vns", "bg/park.png"]);
}

#[test]
fn test_entries_decode_independently() {
    let bytes = sample(None);
    let layout = decode_header(&bytes).unwrap();
    let png = layout.toc.get("bg/park.png").unwrap();
    assert_eq!(decode_entry(&bytes, &layout, png, None).unwrap(), b"\x89PNG");
}

#[test]
fn test_error_kinds() {
    let bytes = sample(None);

    let mut bad_magic = bytes.clone();
    bad_magic[0] = b'Z';
    assert_eq!(decode_header(&bad_magic).unwrap_err().kind(), ErrorKind::Format);

    let mut bad_flags = bytes.clone();
    bad_flags[6] = 0x80;
    assert_eq!(decode_header(&bad_flags).unwrap_err().kind(), ErrorKind::Format);

    let truncated = &bytes[..bytes.len() - 10];
    assert_eq!(decode_header(truncated).unwrap_err().kind(), ErrorKind::Format);

    assert!(matches!(decode_header(b"HG"), Err(Error::InvalidFormat(_))));
}

#[test]
fn test_every_payload_byte_is_guarded() {
    let bytes = sample(None);
    let layout = decode_header(&bytes).unwrap();

    for entry in layout.toc.entries() {
        for offset in entry.offset..entry.offset + entry.stored_size {
            let mut tampered = bytes.clone();
            tampered[offset as usize] ^= 0x5A;
            let err = decode_entry(&tampered, &layout, entry, None).unwrap_err();
            assert!(err.is_corruption(), "byte {offset} of {}: {err}", entry.path);
        }
    }
}
