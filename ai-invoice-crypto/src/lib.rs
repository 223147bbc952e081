//! At-rest protection for license secrets cached on the client machine.
//!
//! A [`SecretProtector`] turns plaintext into an opaque blob that only the
//! same user on the same machine can turn back into plaintext:
//!
//! - **Windows**: the platform data-protection API bound to the current user.
//! - **Elsewhere**: ChaCha20-Poly1305 with a random 256-bit key kept in an
//!   owner-only key file next to the protected data.
//!
//! Unprotected plaintext is returned in [`Zeroizing`] buffers so it is wiped
//! from memory when dropped.

mod cipher;
#[cfg(windows)]
mod dpapi;
mod error;
mod key;
mod protector;

pub use cipher::{open, seal, NONCE_SIZE, TAG_SIZE};
#[cfg(windows)]
pub use dpapi::DpapiProtector;
pub use error::{CryptoError, CryptoResult};
pub use key::{ProtectionKey, KEY_SIZE};
pub use protector::{platform_protector, KeyFileProtector, SecretProtector};
pub use zeroize::Zeroizing;
