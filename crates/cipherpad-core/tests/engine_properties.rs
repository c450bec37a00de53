use chrono::Utc;

use cipherpad_core::crypto::{Engine, KdfParams, KeyMaterial, Label, SecretInput};
use cipherpad_core::CipherpadError;

fn engine() -> Engine {
    Engine::new(KdfParams::new(8, 1, 1)).expect("test params should be valid")
}

fn passphrase_key(passphrase: &str) -> KeyMaterial {
    engine()
        .derive(SecretInput::passphrase(passphrase))
        .expect("derive should succeed")
}

fn sample_plaintexts() -> Vec<String> {
    vec![
        String::new(),
        "hello".to_string(),
        "multi\nline\nnote\n".to_string(),
        "ünïcödé ✓ 日本語 🔐".to_string(),
        "x".repeat(256 * 1024),
    ]
}

#[test]
fn test_round_trip_for_passphrase_and_platform_keys() {
    let keys = vec![
        passphrase_key("alpha"),
        engine()
            .derive(SecretInput::biometric(Utc::now(), vec![0x5A; 32]))
            .expect("derive should succeed"),
    ];

    for key in &keys {
        for plaintext in sample_plaintexts() {
            let blob = engine().encrypt(&plaintext, key).expect("encrypt should succeed");
            let decrypted = engine().decrypt(&blob, key).expect("decrypt should succeed");
            assert_eq!(decrypted.as_str(), plaintext);
        }
    }
}

#[test]
fn test_each_encryption_is_fresh() {
    let key = passphrase_key("alpha");

    let first = engine().encrypt("same text", &key).expect("encrypt should succeed");
    let second = engine().encrypt("same text", &key).expect("encrypt should succeed");

    assert_ne!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_wrong_key_is_authentication_failure() {
    let blob = engine()
        .encrypt("secret", &passphrase_key("alpha"))
        .expect("encrypt should succeed");

    let result = engine().decrypt(&blob, &passphrase_key("wrong"));
    assert!(matches!(result, Err(CipherpadError::AuthenticationFailure)));
}

#[test]
fn test_platform_key_cannot_open_passphrase_blob() {
    let blob = engine()
        .encrypt("secret", &passphrase_key("alpha"))
        .expect("encrypt should succeed");
    let platform = KeyMaterial::from_bytes(Label::biometric(Utc::now()), vec![9u8; 32]);

    let result = engine().decrypt(&blob, &platform);
    assert!(matches!(result, Err(CipherpadError::AuthenticationFailure)));
}

#[test]
fn test_any_flipped_byte_is_authentication_failure() {
    let key = passphrase_key("alpha");
    let blob = engine()
        .encrypt("tamper with me", &key)
        .expect("encrypt should succeed")
        .into_bytes();

    for index in 0..blob.len() {
        let mut corrupted = blob.clone();
        corrupted[index] ^= 0x80;
        let result = engine().decrypt(&corrupted, &key);
        assert!(
            matches!(result, Err(CipherpadError::AuthenticationFailure)),
            "byte {} was not authenticated",
            index
        );
    }
}

#[test]
fn test_garbage_blob_is_authentication_failure() {
    let key = passphrase_key("alpha");
    for garbage in [&b"x"[..], b"CPAD", b"CPAD\x02", &[0u8; 128][..]] {
        let result = engine().decrypt(garbage, &key);
        assert!(matches!(result, Err(CipherpadError::AuthenticationFailure)));
    }
}

#[test]
fn test_blob_records_biometric_label() {
    let created_at = Utc::now();
    let key = engine()
        .derive(SecretInput::biometric(created_at, vec![1u8; 32]))
        .expect("derive should succeed");
    let blob = engine().encrypt("note", &key).expect("encrypt should succeed");

    assert_eq!(Engine::peek_label(&blob), Some(Label::biometric(created_at)));
}
