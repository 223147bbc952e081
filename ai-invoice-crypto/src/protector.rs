//! The [`SecretProtector`] seam and its key-file implementation.
//!
//! Callers hold an `Arc<dyn SecretProtector>` and never see key material.

use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::key::ProtectionKey;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use zeroize::Zeroizing;

/// Protects secrets at rest for the current user.
pub trait SecretProtector: Send + Sync {
    /// Short name of the mechanism, for logs.
    fn name(&self) -> &'static str;

    /// Turns `plaintext` into an opaque blob.
    fn protect(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Recovers plaintext from a blob previously produced by [`protect`](Self::protect).
    fn unprotect(&self, blob: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>>;
}

/// ChaCha20-Poly1305 under a key kept in an owner-only file.
///
/// The key file is read (or created) on first use, not at construction.
pub struct KeyFileProtector {
    key_path: PathBuf,
    key: OnceLock<ProtectionKey>,
}

impl KeyFileProtector {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            key: OnceLock::new(),
        }
    }

    /// A protector bound to an in-memory key; nothing touches the disk.
    pub fn with_key(key: ProtectionKey) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(key);
        Self {
            key_path: PathBuf::new(),
            key: cell,
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    fn key(&self) -> CryptoResult<&ProtectionKey> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }
        let loaded = ProtectionKey::load_or_create(&self.key_path)?;
        // A concurrent caller may have initialized the cell first; both read the same file.
        let _ = self.key.set(loaded);
        self.key
            .get()
            .ok_or_else(|| CryptoError::KeyFile("protection key not initialized".to_string()))
    }
}

impl std::fmt::Debug for KeyFileProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFileProtector")
            .field("key_path", &self.key_path)
            .field("loaded", &self.key.get().is_some())
            .finish()
    }
}

impl SecretProtector for KeyFileProtector {
    fn name(&self) -> &'static str {
        "key-file"
    }

    fn protect(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        cipher::seal(self.key()?, plaintext)
    }

    fn unprotect(&self, blob: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
        cipher::open(self.key()?, blob)
    }
}

/// Returns the preferred protector for this platform.
///
/// Windows uses the user-scoped data-protection API and ignores `key_path`;
/// other platforms use a [`KeyFileProtector`] at `key_path`.
pub fn platform_protector(key_path: impl Into<PathBuf>) -> Arc<dyn SecretProtector> {
    #[cfg(windows)]
    {
        let _ = key_path;
        Arc::new(crate::dpapi::DpapiProtector::new())
    }
    #[cfg(not(windows))]
    {
        Arc::new(KeyFileProtector::new(key_path))
    }
}
