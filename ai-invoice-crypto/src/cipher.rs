//! Sealing with ChaCha20-Poly1305.
//!
//! A sealed blob is laid out as `nonce || ciphertext || tag`.

use crate::error::{CryptoError, CryptoResult};
use crate::key::ProtectionKey;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub fn seal(key: &ProtectionKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypts a blob produced by [`seal`].
pub fn open(key: &ProtectionKey, blob: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption("data too short".to_string()));
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_SIZE);
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| {
            CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
        })
}
