//! Build a patch from a directory and read it back

use crate::common::*;
use hgpk::{CompressionMethod, PatchBuilder, PatchLoader, PatchType};
use pretty_assertions::assert_eq;
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use std::fs;

#[test]
fn test_directory_round_trip() {
    let project = temp_dir();
    create_project(project.path());
    let out = temp_dir();
    let output = out.path().join("graphics.hgp");

    let info = build_from_dir(
        &project.path().join("assets"),
        &output,
        "graphics",
        PatchType::Graphics,
        None,
    );
    assert_eq!(info.total_files, 7);

    let loader = PatchLoader::open(&output).unwrap();
    for path in loader.list_files() {
        let original = fs::read(project.path().join("assets").join(path)).unwrap();
        assert_eq!(loader.read(path).unwrap(), original, "{path}");
    }

    // Extraction recreates the tree
    let extracted = temp_dir();
    assert_eq!(loader.extract_all(extracted.path()).unwrap(), 7);
    assert_eq!(
        fs::read(extracted.path().join("audio/bgm/theme.ogg")).unwrap(),
        b"OggS theme"
    );
}

#[test]
fn test_encrypted_directory_round_trip() {
    let project = temp_dir();
    create_project(project.path());
    let out = temp_dir();
    let output = out.path().join("scripts.hgp");

    build_from_dir(
        &project.path().join("scripts"),
        &output,
        "scripts",
        PatchType::Script,
        Some("pw"),
    );

    let loader = PatchLoader::open_with_password(&output, Some("pw")).unwrap();
    let entry = loader.entry("demo.vns").unwrap().clone();
    assert_eq!(entry.compression, CompressionMethod::Zlib);
    assert!(entry.stored_size < entry.size);
    assert_eq!(
        loader.read("demo.vns").unwrap(),
        fs::read(project.path().join("scripts/demo.vns")).unwrap()
    );
}

#[test]
fn test_rebuild_is_deterministic() {
    let project = temp_dir();
    create_project(project.path());
    let out = temp_dir();

    let build = |file: &str| {
        let output = out.path().join(file);
        build_from_dir(project.path(), &output, "all", PatchType::Dlc, None);
        PatchLoader::open(output).unwrap()
    };
    let first = build("first.hgp");
    let second = build("second.hgp");

    let summary = |loader: &PatchLoader| -> Vec<(String, String)> {
        loader
            .entries()
            .iter()
            .map(|e| (e.path.clone(), e.checksum_hex()))
            .collect()
    };
    assert_eq!(summary(&first), summary(&second));
    assert_eq!(
        fs::read(first.path()).unwrap(),
        fs::read(second.path()).unwrap()
    );
}

fn archive_path() -> impl Strategy<Value = String> {
    vec("[a-z0-9_]{1,8}", 1..4).prop_map(|parts| format!("{}.dat", parts.join("/")))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_any_file_set_round_trips(
        files in btree_map(archive_path(), vec(any::<u8>(), 0..2048), 1..12),
        encrypted in any::<bool>(),
    ) {
        let dir = temp_dir();
        let output = dir.path().join("prop.hgp");
        let password = encrypted.then_some("prop");

        let mut builder = PatchBuilder::new("prop", PatchType::Patch)
            .password_opt(password)
            .kdf_iterations(TEST_KDF_ITERATIONS);
        for (path, data) in &files {
            builder = builder.add_file_data(data.clone(), path);
        }
        builder.build(&output, "1.0.0", "").unwrap();

        let loader = PatchLoader::open_with_password(&output, password).unwrap();
        let listed: Vec<_> = loader.list_files().into_iter().map(str::to_string).collect();
        let expected: Vec<_> = files.keys().cloned().collect();
        prop_assert_eq!(listed, expected);
        for (path, data) in &files {
            prop_assert_eq!(&loader.read(path).unwrap(), data);
        }
    }
}
