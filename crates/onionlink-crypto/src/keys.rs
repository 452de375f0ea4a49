//! Symmetric key material and the CSPRNG

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use onionlink_core::consts::{BLAKE2_DIGEST_LENGTH_MAX, SYMMETRIC_KEY_LENGTH};
use onionlink_core::{Error, FatalKind, Result};

use crate::hash::{blake2b, HashParams};

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    bytes: [u8; SYMMETRIC_KEY_LENGTH],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SYMMETRIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::fatal(
                FatalKind::InvalidLength,
                format!(
                    "invalid key length ({} bytes), expected {SYMMETRIC_KEY_LENGTH} bytes",
                    bytes.len()
                ),
            )
        })?;
        Ok(Self { bytes })
    }

    /// Generate a random key from the CSPRNG.
    pub fn generate() -> Result<Self> {
        let mut random = csprng(SYMMETRIC_KEY_LENGTH)?;
        let key = Self::from_slice(&random);
        random.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_LENGTH] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Return `len` bytes (1..=64) of key material.
///
/// OS entropy is passed through BLAKE2b before use, so a weak kernel pool
/// does not leak directly into keys.
pub fn csprng(len: usize) -> Result<Vec<u8>> {
    if len == 0 || len > BLAKE2_DIGEST_LENGTH_MAX {
        return Err(Error::fatal(
            FatalKind::InvalidParameter,
            format!("CSPRNG output must be 1..={BLAKE2_DIGEST_LENGTH_MAX} bytes (got {len})"),
        ));
    }

    let mut entropy = [0u8; BLAKE2_DIGEST_LENGTH_MAX];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| Error::fatal(FatalKind::CryptoFailure, format!("OS entropy source failed: {e}")))?;

    let out = blake2b(&entropy, &HashParams::with_digest_size(len));
    entropy.zeroize();
    let out = out?;

    if out.len() != len {
        return Err(Error::fatal(
            FatalKind::CryptoFailure,
            format!("CSPRNG returned {} bytes instead of {len}", out.len()),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let k1 = SymmetricKey::generate().unwrap();
        let k2 = SymmetricKey::generate().unwrap();
        assert_ne!(k1, k2, "random keys must differ");
    }

    #[test]
    fn test_from_slice_length() {
        assert!(SymmetricKey::from_slice(&[0u8; 32]).is_ok());
        for len in [0, 31, 33] {
            let err = SymmetricKey::from_slice(&vec![0u8; len]).unwrap_err();
            assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidLength));
        }
    }

    #[test]
    fn test_debug_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; SYMMETRIC_KEY_LENGTH]);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("171"));
    }

    #[test]
    fn test_csprng_lengths() {
        assert_eq!(csprng(1).unwrap().len(), 1);
        assert_eq!(csprng(32).unwrap().len(), 32);
        assert_eq!(csprng(64).unwrap().len(), 64);
        assert_ne!(csprng(32).unwrap(), csprng(32).unwrap());
    }

    #[test]
    fn test_csprng_rejects_bad_lengths() {
        for len in [0, 65] {
            let err = csprng(len).unwrap_err();
            assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidParameter));
        }
    }
}
