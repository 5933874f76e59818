//! Common test utilities and fixtures

#![allow(dead_code)]

use hgpk::{Manifest, PatchBuilder, PatchDescriptor, PatchInfo, PatchType};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Key derivation cost used by tests; the default is far too slow in debug builds
pub const TEST_KDF_ITERATIONS: u32 = 16;

/// Create a temporary directory for tests
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Generate test data of a specific size
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Generate repetitive test data (good for compression tests)
pub fn generate_repetitive_data(pattern: &[u8], total_size: usize) -> Vec<u8> {
    pattern.iter().copied().cycle().take(total_size).collect()
}

/// Create a test file, including parent directories
pub fn create_test_file(dir: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Build `<dir>/<name>.hgp` from in-memory files
pub fn build_patch(
    dir: &Path,
    name: &str,
    patch_type: PatchType,
    files: &[(&str, &[u8])],
    password: Option<&str>,
) -> PathBuf {
    let output = dir.join(format!("{name}.hgp"));
    let mut builder = PatchBuilder::new(name, patch_type)
        .password_opt(password)
        .kdf_iterations(TEST_KDF_ITERATIONS);
    for (path, content) in files {
        builder = builder.add_file_data(content.to_vec(), path);
    }
    builder
        .build(&output, "1.0.0", "test patch")
        .expect("Failed to build test patch");
    output
}

/// Build a patch from a source directory and return its summary
pub fn build_from_dir(
    source: &Path,
    output: &Path,
    name: &str,
    patch_type: PatchType,
    password: Option<&str>,
) -> PatchInfo {
    PatchBuilder::new(name, patch_type)
        .password_opt(password)
        .kdf_iterations(TEST_KDF_ITERATIONS)
        .add_directory(source, "")
        .build(output, "1.0.0", "")
        .expect("Failed to build patch from directory")
}

/// Manifest from `(name, priority, enabled)` records
pub fn manifest(records: &[(&str, i32, bool)]) -> Manifest {
    let mut manifest = Manifest::new("1.0.0");
    for (name, priority, enabled) in records {
        manifest.push(PatchDescriptor::new(*name, *priority).enabled(*enabled));
    }
    manifest
}

/// A small visual-novel project tree
pub fn create_project(root: &Path) {
    create_test_file(root, "assets/backgrounds/park.png", b"\x89PNG park");
    create_test_file(root, "assets/backgrounds/school.png", b"\x89PNG school");
    create_test_file(root, "assets/characters/alice/happy.png", b"\x89PNG alice");
    create_test_file(root, "assets/cg/ending.png", &generate_test_data(4096));
    create_test_file(root, "assets/audio/voice/alice_001.ogg", b"OggS voice");
    create_test_file(root, "assets/audio/bgm/theme.ogg", b"OggS theme");
    create_test_file(root, "assets/audio/se/click.wav", b"RIFF click");
    create_test_file(
        root,
        "scripts/demo.vns",
        &generate_repetitive_data(b"alice \"Hello!\"\n", 2048),
    );
}
