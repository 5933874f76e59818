//! Password protection through the public loader

use crate::common::*;
use hgpk::{Error, ErrorKind, OpenOptions, PatchLoader, PatchType};
use pretty_assertions::assert_eq;

fn protected(dir: &std::path::Path) -> std::path::PathBuf {
    build_patch(
        dir,
        "voice",
        PatchType::Voice,
        &[
            ("alice/001.ogg", generate_test_data(3000).as_slice()),
            ("alice/002.ogg", b"OggS short".as_slice()),
            ("bob/001.ogg", generate_repetitive_data(b"bob", 900).as_slice()),
        ],
        Some("s3cret"),
    )
}

#[test]
fn test_wrong_password_fails_at_open() {
    let dir = temp_dir();
    let path = protected(dir.path());

    let err = PatchLoader::open_with_password(&path, Some("guess")).unwrap_err();
    assert!(matches!(err, Error::InvalidPassword(_)));
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[test]
fn test_correct_password_reads_everything() {
    let dir = temp_dir();
    let path = protected(dir.path());

    let loader = OpenOptions::new().password("s3cret").open(&path).unwrap();
    assert!(loader.is_encrypted());
    assert!(!loader.is_locked());
    assert_eq!(loader.read("alice/001.ogg").unwrap(), generate_test_data(3000));
    assert_eq!(loader.read("alice/002.ogg").unwrap(), b"OggS short");
    assert_eq!(
        loader.read("bob/001.ogg").unwrap(),
        generate_repetitive_data(b"bob", 900)
    );
    assert!(loader.verify().unwrap().is_ok());
}

#[test]
fn test_locked_loader_lists_but_cannot_read() {
    let dir = temp_dir();
    let path = protected(dir.path());

    let loader = PatchLoader::open(&path).unwrap();
    assert!(loader.is_locked());
    assert_eq!(
        loader.list_files(),
        vec!["alice/001.ogg", "alice/002.ogg", "bob/001.ogg"]
    );
    let err = loader.read("alice/001.ogg").unwrap_err();
    assert!(matches!(err, Error::PasswordRequired(_)));
}

#[test]
fn test_ciphertext_hides_content() {
    let dir = temp_dir();
    let path = protected(dir.path());

    let raw = std::fs::read(&path).unwrap();
    assert!(!raw.windows(10).any(|w| w == b"OggS short"));
}
