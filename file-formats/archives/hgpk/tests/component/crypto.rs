//! Key derivation, key checking and keystream behaviour

use hgpk::crypto::{
    CHECK_SIZE, check_key, derive_key, encryption_check, generate_salt, transform,
};

#[test]
fn test_salt_changes_key() {
    let a = derive_key("password", &generate_salt(), 16);
    let b = derive_key("password", &generate_salt(), 16);
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn test_key_is_reproducible() {
    let salt = [42u8; 16];
    assert_eq!(derive_key("pw", &salt, 16), derive_key("pw", &salt, 16));
    assert_ne!(derive_key("pw", &salt, 16), derive_key("pw", &salt, 17));
}

#[test]
fn test_check_value_rejects_other_keys() {
    let salt = generate_salt();
    let right = derive_key("right", &salt, 16);
    let wrong = derive_key("wrong", &salt, 16);

    let check = encryption_check(&right);
    assert_eq!(check.len(), CHECK_SIZE);
    assert!(check_key(&right, &check));
    assert!(!check_key(&wrong, &check));
    assert!(!check_key(&right, &check[..CHECK_SIZE - 1]));
}

#[test]
fn test_random_offset_reads_decrypt() {
    let key = derive_key("pw", &[1u8; 16], 16);
    let plain: Vec<u8> = (0..1000u32).map(|i| (i * 7 % 256) as u8).collect();

    let mut encrypted = plain.clone();
    transform(&key, 84, &mut encrypted);
    assert_ne!(encrypted, plain);

    // Decrypt a slice from the middle without touching what precedes it
    let mut middle = encrypted[333..517].to_vec();
    transform(&key, 84 + 333, &mut middle);
    assert_eq!(middle, &plain[333..517]);
}
