//! Concurrent reads after setup

use crate::common::*;
use hgpk::{Passwords, PatchLoader, PatchRegistry, PatchType, RegistryOptions};
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_reads_same_path() {
    let dir = temp_dir();
    let payload = generate_test_data(64 * 1024);
    let path = build_patch(
        dir.path(),
        "voice",
        PatchType::Voice,
        &[("big.ogg", payload.as_slice()), ("small.ogg", b"tiny".as_slice())],
        Some("pw"),
    );
    let loader = Arc::new(PatchLoader::open_with_password(&path, Some("pw")).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let loader = Arc::clone(&loader);
            thread::spawn(move || {
                let name = if i % 2 == 0 { "big.ogg" } else { "small.ogg" };
                for _ in 0..10 {
                    loader.read(name).unwrap();
                }
                loader.read("big.ogg").unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), payload);
    }
}

#[test]
fn test_registry_shared_across_scoped_threads() {
    let dir = temp_dir();
    build_patch(
        dir.path(),
        "base",
        PatchType::Graphics,
        &[("bg/a.png", b"a".as_slice()), ("bg/b.png", b"b".as_slice())],
        None,
    );
    let registry = PatchRegistry::load_all(
        &manifest(&[("base", 0, true)]),
        dir.path(),
        &Passwords::new(),
        &RegistryOptions::default(),
    )
    .unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                assert_eq!(registry.read("bg/a.png").unwrap(), b"a");
                assert_eq!(registry.read("bg/b.png").unwrap(), b"b");
            });
        }
    });
}
