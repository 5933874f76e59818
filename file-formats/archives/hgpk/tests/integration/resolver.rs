//! Namespace resolution over an unpacked tree and a patch overlay

use crate::common::*;
use hgpk::{
    AssetKind, AssetResolver, Error, Passwords, PatchRegistry, PatchType, RegistryOptions,
    ResolvedAsset,
};
use pretty_assertions::assert_eq;

fn registry_with(dir: &std::path::Path, files: &[(&str, &[u8])]) -> PatchRegistry {
    build_patch(dir, "patch1", PatchType::Graphics, files, None);
    PatchRegistry::load_all(
        &manifest(&[("patch1", 0, true)]),
        dir,
        &Passwords::new(),
        &RegistryOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_namespace_wins_over_global() {
    let data = temp_dir();
    let assets = temp_dir();
    let registry = registry_with(
        data.path(),
        &[
            ("demo/bg/park.png", b"demo park".as_slice()),
            ("bg/park.png", b"global park".as_slice()),
        ],
    );
    let resolver = AssetResolver::new(assets.path()).with_registry(&registry);

    let found = resolver.resolve("demo", "bg/park.png", None).unwrap();
    assert_eq!(found, ResolvedAsset::Patch("demo/bg/park.png".into()));
    assert_eq!(resolver.read(&found).unwrap(), b"demo park");

    // Other scripts fall through to the global copy
    assert_eq!(
        resolver.resolve_and_read("other", "bg/park.png", None).unwrap(),
        b"global park"
    );
}

#[test]
fn test_bare_name_finds_kind_subdir() {
    let data = temp_dir();
    let assets = temp_dir();
    let registry = registry_with(
        data.path(),
        &[
            ("bg/park.png", b"bg park".as_slice()),
            ("cg/park.png", b"cg park".as_slice()),
        ],
    );
    let resolver = AssetResolver::new(assets.path()).with_registry(&registry);

    // Images try bg before cg
    assert_eq!(
        resolver.resolve("demo", "park.png", None).unwrap(),
        ResolvedAsset::Patch("bg/park.png".into())
    );
    // A hint narrows the search to one subdirectory
    assert_eq!(
        resolver.resolve("demo", "park.png", Some(AssetKind::Cg)).unwrap(),
        ResolvedAsset::Patch("cg/park.png".into())
    );
}

#[test]
fn test_filesystem_checked_before_registry() {
    let data = temp_dir();
    let assets = temp_dir();
    let registry = registry_with(data.path(), &[("bg/park.png", b"packed".as_slice())]);
    let on_disk = create_test_file(assets.path(), "bg/park.png", b"loose");
    let resolver = AssetResolver::new(assets.path()).with_registry(&registry);

    let found = resolver.resolve("demo", "bg/park.png", None).unwrap();
    assert_eq!(found, ResolvedAsset::File(on_disk));
    assert_eq!(resolver.read(&found).unwrap(), b"loose");
}

#[test]
fn test_directories_never_match() {
    let assets = temp_dir();
    std::fs::create_dir_all(assets.path().join("demo/bg/park.png")).unwrap();
    let resolver = AssetResolver::new(assets.path());

    let err = resolver.resolve("demo", "bg/park.png", None).unwrap_err();
    assert!(matches!(err, Error::AssetNotFound { .. }));
}

#[test]
fn test_not_found_names_reference_and_namespace() {
    let assets = temp_dir();
    let resolver = AssetResolver::new(assets.path());

    match resolver.resolve("demo", "bg/missing.png", None) {
        Err(Error::AssetNotFound {
            reference,
            namespace,
        }) => {
            assert_eq!(reference, "bg/missing.png");
            assert_eq!(namespace.as_deref(), Some("demo"));
        }
        other => panic!("expected AssetNotFound, got {other:?}"),
    }
}

#[test]
fn test_actor_map_namespace_first() {
    let assets = temp_dir();
    create_test_file(assets.path(), "config/actors_map.json", br#"{"Alice": "alice"}"#);
    create_test_file(
        assets.path(),
        "demo/config/actors_map.json",
        br#"{"Alice": "alice_demo"}"#,
    );
    let resolver = AssetResolver::new(assets.path());

    assert_eq!(
        resolver.load_actor_map("demo").unwrap().get("Alice"),
        Some("alice_demo")
    );
    assert_eq!(
        resolver.load_actor_map("other").unwrap().get("Alice"),
        Some("alice")
    );
}
