//! Protection key generation and key-file handling.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of protection keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// A symmetric protection key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ProtectionKey {
    bytes: [u8; KEY_SIZE],
}

impl ProtectionKey {
    /// Generates a random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Reads the key stored at `path`, creating a fresh one if absent.
    ///
    /// New key files are created exclusively and, on Unix, readable and
    /// writable by the owner only. If another process wins the race to
    /// create the file, its key is read back instead.
    pub fn load_or_create(path: &Path) -> CryptoResult<Self> {
        match Self::load(path) {
            Ok(key) => return Ok(key),
            Err(CryptoError::Io(e)) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let key = Self::generate();
        match create_owner_only(path) {
            Ok(mut file) => {
                file.write_all(key.as_bytes())?;
                file.sync_all()?;
                debug!(path = %path.display(), "created license protection key");
                Ok(key)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Self::load(path),
            Err(e) => Err(CryptoError::KeyFile(format!(
                "cannot create {}: {e}",
                path.display()
            ))),
        }
    }

    fn load(path: &Path) -> CryptoResult<Self> {
        let bytes = Zeroizing::new(fs::read(path)?);
        Self::from_slice(&bytes).map_err(|e| {
            CryptoError::KeyFile(format!("{} is not a protection key: {e}", path.display()))
        })
    }
}

impl std::fmt::Debug for ProtectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(unix)]
fn create_owner_only(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_owner_only(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}
