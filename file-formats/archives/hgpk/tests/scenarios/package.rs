//! Package a project, then play it back through registry and resolver

use crate::common::*;
use hgpk::{
    AssetResolver, Manifest, Passwords, PatchBuilder, PatchDescriptor, PatchLoader,
    PatchRegistry, PatchType, RegistryOptions, create_update_patch, package_game,
};
use pretty_assertions::assert_eq;

#[test]
fn test_package_and_play() {
    let project = temp_dir();
    create_project(project.path());
    let dist = temp_dir();

    let built = package_game(project.path(), dist.path(), None, "1.0.0").unwrap();
    assert_eq!(built.len(), 4);

    let registry =
        PatchRegistry::open_dir(dist.path(), &Passwords::new(), &RegistryOptions::default())
            .unwrap();
    assert_eq!(registry.patch_count(), 4);
    assert_eq!(
        registry.read("bg/park.png").unwrap(),
        b"\x89PNG park"
    );
    assert_eq!(registry.read("voice/alice_001.ogg").unwrap(), b"OggS voice");
    assert_eq!(registry.read("bgm/theme.ogg").unwrap(), b"OggS theme");
    assert!(registry.contains("demo.vns"));
}

#[test]
fn test_packaged_project_resolves_by_file_name() {
    let project = temp_dir();
    create_project(project.path());
    create_test_file(project.path(), "assets/demo/bg/park.png", b"\x89PNG demo park");
    create_test_file(
        project.path(),
        "assets/config/actors_map.json",
        br#"{"Alice": "alice"}"#,
    );
    let dist = temp_dir();
    package_game(project.path(), dist.path(), None, "1.0.0").unwrap();

    let registry =
        PatchRegistry::open_dir(dist.path(), &Passwords::new(), &RegistryOptions::default())
            .unwrap();
    let assets = temp_dir();
    let resolver = AssetResolver::new(assets.path()).with_registry(&registry);

    assert_eq!(
        resolver.resolve_and_read("intro", "park.png", None).unwrap(),
        b"\x89PNG park"
    );
    assert_eq!(
        resolver.resolve_and_read("demo", "park.png", None).unwrap(),
        b"\x89PNG demo park"
    );
    assert_eq!(
        resolver.resolve_and_read("intro", "alice_001.ogg", None).unwrap(),
        b"OggS voice"
    );
    assert_eq!(
        resolver.resolve_and_read("intro", "alice/happy.png", None).unwrap(),
        b"\x89PNG alice"
    );
    assert_eq!(
        resolver.load_actor_map("demo").unwrap().folder_for("Alice"),
        "alice"
    );
}

#[test]
fn test_update_patch_overrides_packaged_asset() {
    let project = temp_dir();
    create_project(project.path());
    let dist = temp_dir();
    package_game(project.path(), dist.path(), None, "1.0.0").unwrap();

    let fix = temp_dir();
    create_test_file(fix.path(), "bgm/theme.ogg", b"OggS remastered");
    create_update_patch("fix1", fix.path(), dist.path().join("fix1.hgp"), None, "1.0.1").unwrap();

    // The update only takes effect once the manifest ranks it
    let mut manifest = Manifest::load(dist.path().join("patches.json")).unwrap();
    manifest.push(PatchDescriptor::new("fix1", 100).with_type(PatchType::Patch));
    manifest.save(dist.path().join("patches.json")).unwrap();

    let registry =
        PatchRegistry::open_dir(dist.path(), &Passwords::new(), &RegistryOptions::default())
            .unwrap();
    assert_eq!(registry.read("bgm/theme.ogg").unwrap(), b"OggS remastered");
    assert_eq!(registry.find_patch("bgm/theme.ogg"), Some("fix1"));
}

#[test]
fn test_script_namespace_over_packed_assets() {
    let dist = temp_dir();
    PatchBuilder::new("patch1", PatchType::Graphics)
        .add_file_data(b"global".to_vec(), "bg/park.png")
        .add_file_data(b"demo only".to_vec(), "demo/bg/park.png")
        .add_file_data(br#"{"Alice": "alice"}"#.to_vec(), "config/actors_map.json")
        .build(dist.path().join("patch1.hgp"), "1.0.0", "")
        .unwrap();

    let registry =
        PatchRegistry::open_dir(dist.path(), &Passwords::new(), &RegistryOptions::default())
            .unwrap();
    let assets = temp_dir();
    let resolver = AssetResolver::new(assets.path()).with_registry(&registry);

    assert_eq!(
        resolver.resolve_and_read("demo", "bg/park.png", None).unwrap(),
        b"demo only"
    );
    assert_eq!(
        resolver.resolve_and_read("intro", "park.png", None).unwrap(),
        b"global"
    );
    assert_eq!(
        resolver.load_actor_map("demo").unwrap().folder_for("Alice"),
        "alice"
    );

    let loader = PatchLoader::open(dist.path().join("patch1.hgp")).unwrap();
    assert_eq!(loader.len(), 3);
}
