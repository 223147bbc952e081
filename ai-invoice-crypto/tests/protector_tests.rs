use ai_invoice_crypto::{
    platform_protector, CryptoError, KeyFileProtector, ProtectionKey, SecretProtector, KEY_SIZE,
    NONCE_SIZE, TAG_SIZE,
};

// ── KeyFileProtector ────────────────────────────────────────────

#[test]
fn protect_unprotect_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let protector = KeyFileProtector::new(dir.path().join("license.key"));
    let blob = protector.protect(b"token-abc").unwrap();
    assert_ne!(blob.as_slice(), b"token-abc");
    assert_eq!(protector.unprotect(&blob).unwrap().as_slice(), b"token-abc");
}

#[test]
fn blob_does_not_contain_plaintext() {
    let protector = KeyFileProtector::with_key(ProtectionKey::generate());
    let secret = b"eyJhbGciOiJlZDI1NTE5In0";
    let blob = protector.protect(secret).unwrap();
    assert!(!blob.windows(secret.len()).any(|w| w == secret));
    assert_eq!(blob.len(), NONCE_SIZE + secret.len() + TAG_SIZE);
}

#[test]
fn key_file_is_created_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("license.key");
    let protector = KeyFileProtector::new(&path);
    assert!(!path.exists());

    protector.protect(b"x").unwrap();
    assert_eq!(std::fs::read(&path).unwrap().len(), KEY_SIZE);
}

#[cfg(unix)]
#[test]
fn key_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("license.key");
    ProtectionKey::load_or_create(&path).unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn existing_key_file_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("license.key");
    let blob = KeyFileProtector::new(&path).protect(b"persisted").unwrap();

    let reopened = KeyFileProtector::new(&path);
    assert_eq!(reopened.unprotect(&blob).unwrap().as_slice(), b"persisted");
}

#[test]
fn other_key_cannot_unprotect() {
    let a = KeyFileProtector::with_key(ProtectionKey::generate());
    let b = KeyFileProtector::with_key(ProtectionKey::generate());
    let blob = a.protect(b"secret").unwrap();
    assert!(matches!(b.unprotect(&blob), Err(CryptoError::Decryption(_))));
}

#[test]
fn tampered_blob_is_rejected() {
    let protector = KeyFileProtector::with_key(ProtectionKey::generate());
    let mut blob = protector.protect(b"secret").unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    assert!(protector.unprotect(&blob).is_err());
}

#[test]
fn truncated_key_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("license.key");
    std::fs::write(&path, [1u8; 7]).unwrap();
    let err = KeyFileProtector::new(&path).protect(b"x").unwrap_err();
    assert!(matches!(err, CryptoError::KeyFile(_)));
}

#[test]
fn debug_does_not_expose_key() {
    let protector = KeyFileProtector::with_key(ProtectionKey::from_bytes([0xAB; KEY_SIZE]));
    let debug = format!("{protector:?}");
    assert!(!debug.to_lowercase().contains("ab, ab"));
    assert!(format!("{:?}", ProtectionKey::generate()).contains("REDACTED"));
}

// ── Platform selection ──────────────────────────────────────────

#[test]
fn platform_protector_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let protector = platform_protector(dir.path().join("license.key"));
    let blob = protector.protect(b"platform").unwrap();
    assert_eq!(protector.unprotect(&blob).unwrap().as_slice(), b"platform");
}

#[cfg(not(windows))]
#[test]
fn platform_protector_uses_key_file_off_windows() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(platform_protector(dir.path().join("k")).name(), "key-file");
}
