use ai_invoice_crypto::{CryptoError, ProtectionKey};

#[test]
fn invalid_key_length_names_both_sizes() {
    let err = ProtectionKey::from_slice(&[0u8; 5]).unwrap_err();
    assert!(matches!(
        err,
        CryptoError::InvalidKeyLength {
            expected: 32,
            actual: 5
        }
    ));
    assert_eq!(err.to_string(), "invalid key length: expected 32, got 5");
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: CryptoError = io.into();
    assert!(err.to_string().contains("denied"));
}

#[test]
fn messages_have_prefixes() {
    assert!(CryptoError::Encryption("x".into()).to_string().starts_with("encryption failed"));
    assert!(CryptoError::Decryption("x".into()).to_string().starts_with("decryption failed"));
    assert!(CryptoError::Platform("x".into()).to_string().contains("platform"));
}
