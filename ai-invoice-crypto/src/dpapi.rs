//! Windows data-protection API (DPAPI) bound to the current user.

use crate::error::{CryptoError, CryptoResult};
use crate::protector::SecretProtector;
use std::ptr;
use windows_sys::Win32::Foundation::{GetLastError, LocalFree};
use windows_sys::Win32::Security::Cryptography::{
    CryptProtectData, CryptUnprotectData, CRYPTPROTECT_UI_FORBIDDEN, CRYPT_INTEGER_BLOB,
};
use zeroize::{Zeroize, Zeroizing};

/// Protects secrets with `CryptProtectData` under the current user's credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct DpapiProtector;

impl DpapiProtector {
    pub fn new() -> Self {
        Self
    }
}

fn input_blob(data: &[u8]) -> CryptoResult<CRYPT_INTEGER_BLOB> {
    let len = u32::try_from(data.len())
        .map_err(|_| CryptoError::Platform("secret too large".to_string()))?;
    Ok(CRYPT_INTEGER_BLOB {
        cbData: len,
        pbData: data.as_ptr() as *mut u8,
    })
}

/// Copies `buffer` out and zeroes the source.
fn drain(buffer: &mut [u8]) -> Vec<u8> {
    let out = buffer.to_vec();
    buffer.zeroize();
    out
}

/// Copies the output blob and releases the buffer DPAPI allocated for it.
///
/// Plaintext output is wiped before the buffer goes back to the heap.
///
/// # Safety
/// `blob` must have been filled by a successful DPAPI call.
unsafe fn take_output(blob: CRYPT_INTEGER_BLOB, wipe: bool) -> Vec<u8> {
    let buffer = unsafe { std::slice::from_raw_parts_mut(blob.pbData, blob.cbData as usize) };
    let out = if wipe { drain(buffer) } else { buffer.to_vec() };
    unsafe {
        LocalFree(blob.pbData as _);
    }
    out
}

impl SecretProtector for DpapiProtector {
    fn name(&self) -> &'static str {
        "dpapi"
    }

    fn protect(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let input = input_blob(plaintext)?;
        let mut output = CRYPT_INTEGER_BLOB {
            cbData: 0,
            pbData: ptr::null_mut(),
        };
        // SAFETY: input points into `plaintext`, which outlives the call; the
        // output buffer is allocated by DPAPI and freed in `take_output`.
        let ok = unsafe {
            CryptProtectData(
                &input,
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                CRYPTPROTECT_UI_FORBIDDEN,
                &mut output,
            )
        };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(CryptoError::Platform(format!(
                "CryptProtectData failed with error {code}"
            )));
        }
        Ok(unsafe { take_output(output, false) })
    }

    fn unprotect(&self, blob: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
        let input = input_blob(blob)?;
        let mut output = CRYPT_INTEGER_BLOB {
            cbData: 0,
            pbData: ptr::null_mut(),
        };
        // SAFETY: as in `protect`.
        let ok = unsafe {
            CryptUnprotectData(
                &input,
                ptr::null_mut(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                CRYPTPROTECT_UI_FORBIDDEN,
                &mut output,
            )
        };
        if ok == 0 {
            let code = unsafe { GetLastError() };
            return Err(CryptoError::Decryption(format!(
                "CryptUnprotectData failed with error {code}"
            )));
        }
        Ok(Zeroizing::new(unsafe { take_output(output, true) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_zeroes_the_source() {
        let mut buffer = b"license-token".to_vec();
        let out = drain(&mut buffer);
        assert_eq!(out, b"license-token");
        assert!(buffer.iter().all(|b| *b == 0));
    }

    #[test]
    fn round_trip_for_current_user() {
        let protector = DpapiProtector::new();
        let blob = protector.protect(b"license-token").unwrap();
        assert_ne!(blob.as_slice(), b"license-token");
        assert_eq!(protector.unprotect(&blob).unwrap().as_slice(), b"license-token");
    }
}
