//! Priority overlay across several patches on disk

use crate::common::*;
use hgpk::{
    ErrorKind, Manifest, Passwords, PatchDescriptor, PatchRegistry, PatchType, RegistryOptions,
};
use pretty_assertions::assert_eq;

/// Two patches that both ship `bg/a.png`
fn overlapping(dir: &std::path::Path) {
    build_patch(
        dir,
        "base",
        PatchType::Graphics,
        &[("bg/a.png", b"base".as_slice()), ("bg/b.png", b"only base".as_slice())],
        None,
    );
    build_patch(
        dir,
        "update",
        PatchType::Patch,
        &[("bg/a.png", b"update".as_slice()), ("bg/c.png", b"only update".as_slice())],
        None,
    );
}

#[test]
fn test_higher_priority_overrides() {
    let dir = temp_dir();
    overlapping(dir.path());

    let manifest = manifest(&[("base", 0, true), ("update", 10, true)]);
    let registry = PatchRegistry::load_all(
        &manifest,
        dir.path(),
        &Passwords::new(),
        &RegistryOptions::default(),
    )
    .unwrap();

    assert_eq!(registry.read("bg/a.png").unwrap(), b"update");
    assert_eq!(registry.find_patch("bg/a.png"), Some("update"));
    // Non-overlapping files stay visible from both
    assert_eq!(registry.read("bg/b.png").unwrap(), b"only base");
    assert_eq!(registry.read("bg/c.png").unwrap(), b"only update");
    assert_eq!(
        registry.list_files().into_iter().collect::<Vec<_>>(),
        vec!["bg/a.png", "bg/b.png", "bg/c.png"]
    );
}

#[test]
fn test_swapping_priorities_swaps_winner() {
    let dir = temp_dir();
    overlapping(dir.path());

    let manifest = manifest(&[("base", 10, true), ("update", 0, true)]);
    let registry = PatchRegistry::load_all(
        &manifest,
        dir.path(),
        &Passwords::new(),
        &RegistryOptions::default(),
    )
    .unwrap();

    assert_eq!(registry.read("bg/a.png").unwrap(), b"base");
}

#[test]
fn test_disabled_patch_is_invisible() {
    let dir = temp_dir();
    overlapping(dir.path());

    let manifest = manifest(&[("base", 0, true), ("update", 10, false)]);
    let registry = PatchRegistry::load_all(
        &manifest,
        dir.path(),
        &Passwords::new(),
        &RegistryOptions::default(),
    )
    .unwrap();

    assert_eq!(registry.patch_count(), 1);
    assert_eq!(registry.read("bg/a.png").unwrap(), b"base");
    assert!(!registry.contains("bg/c.png"));
    assert!(registry.loader("update").is_none());
}

#[test]
fn test_equal_priority_first_declared_wins() {
    let dir = temp_dir();
    overlapping(dir.path());

    for (first, expected) in [("base", b"base".as_slice()), ("update", b"update".as_slice())] {
        let second = if first == "base" { "update" } else { "base" };
        let manifest = manifest(&[(first, 5, true), (second, 5, true)]);
        let registry = PatchRegistry::load_all(
            &manifest,
            dir.path(),
            &Passwords::new(),
            &RegistryOptions::default(),
        )
        .unwrap();
        assert_eq!(registry.read("bg/a.png").unwrap(), expected);
    }
}

#[test]
fn test_missing_path_everywhere() {
    let dir = temp_dir();
    overlapping(dir.path());

    let registry = PatchRegistry::load_all(
        &manifest(&[("base", 0, true), ("update", 1, true)]),
        dir.path(),
        &Passwords::new(),
        &RegistryOptions::default(),
    )
    .unwrap();

    let err = registry.read("bg/missing.png").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_wrong_password_skipped_unless_strict() {
    let dir = temp_dir();
    build_patch(
        dir.path(),
        "base",
        PatchType::Graphics,
        &[("bg/a.png", b"base".as_slice())],
        None,
    );
    build_patch(
        dir.path(),
        "secret",
        PatchType::Dlc,
        &[("bg/a.png", b"secret".as_slice())],
        Some("right"),
    );
    let manifest = manifest(&[("base", 0, true), ("secret", 10, true)]);
    let passwords = Passwords::new().with("secret", "wrong");

    let registry = PatchRegistry::load_all(
        &manifest,
        dir.path(),
        &passwords,
        &RegistryOptions::default(),
    )
    .unwrap();
    assert_eq!(registry.patch_count(), 1);
    assert_eq!(registry.warnings().len(), 1);
    assert_eq!(registry.warnings()[0].patch, "secret");
    // The skipped patch never shadows lower patches
    assert_eq!(registry.read("bg/a.png").unwrap(), b"base");

    let err = PatchRegistry::load_all(
        &manifest,
        dir.path(),
        &passwords,
        &RegistryOptions::new().strict(true),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);

    let registry = PatchRegistry::load_all(
        &manifest,
        dir.path(),
        &Passwords::new().with("secret", "right"),
        &RegistryOptions::new().strict(true),
    )
    .unwrap();
    assert_eq!(registry.read("bg/a.png").unwrap(), b"secret");
}

#[test]
fn test_corrupt_patch_fails_load() {
    let dir = temp_dir();
    let path = build_patch(
        dir.path(),
        "base",
        PatchType::Graphics,
        &[("bg/a.png", b"base".as_slice())],
        None,
    );
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&path, bytes).unwrap();

    let err = PatchRegistry::load_all(
        &manifest(&[("base", 0, true)]),
        dir.path(),
        &Passwords::new(),
        &RegistryOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_corruption());
}

#[test]
fn test_open_dir_prefers_manifest() {
    let dir = temp_dir();
    overlapping(dir.path());

    let mut manifest = Manifest::new("2.0.0");
    manifest.push(PatchDescriptor::new("base", 3));
    manifest.push(PatchDescriptor::new("update", 1));
    manifest.save(dir.path().join("patches.json")).unwrap();

    let registry =
        PatchRegistry::open_dir(dir.path(), &Passwords::new(), &RegistryOptions::default())
            .unwrap();
    assert_eq!(registry.game_version(), "2.0.0");
    assert_eq!(registry.read("bg/a.png").unwrap(), b"base");
    let order: Vec<_> = registry.patches().map(|d| d.name.as_str()).collect();
    assert_eq!(order, vec!["base", "update"]);
}

#[test]
fn test_scanned_patches_use_embedded_priority() {
    let dir = temp_dir();
    for (name, priority, content) in [("aaa_low", 1, "low"), ("zzz_high", 9, "high")] {
        hgpk::PatchBuilder::new(name, PatchType::Patch)
            .kdf_iterations(TEST_KDF_ITERATIONS)
            .priority(priority)
            .add_file_data(content.as_bytes().to_vec(), "script.vns")
            .build(dir.path().join(format!("{name}.hgp")), "1.0.0", "")
            .unwrap();
    }

    let registry =
        PatchRegistry::open_dir(dir.path(), &Passwords::new(), &RegistryOptions::default())
            .unwrap();

    let order: Vec<_> = registry.patches().map(|d| (d.name.as_str(), d.priority)).collect();
    assert_eq!(order, vec![("zzz_high", 9), ("aaa_low", 1)]);
    assert_eq!(registry.read("script.vns").unwrap(), b"high");
}

#[test]
fn test_scan_skips_unreadable_patch() {
    let dir = temp_dir();
    overlapping(dir.path());
    create_test_file(dir.path(), "broken.hgp", b"not a patch at all");

    let registry =
        PatchRegistry::open_dir(dir.path(), &Passwords::new(), &RegistryOptions::default())
            .unwrap();

    assert_eq!(registry.patch_count(), 2);
    assert_eq!(registry.find_patch("bg/b.png"), Some("base"));
}
