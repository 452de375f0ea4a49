//! Protection applied to a blob before it reaches the disk

use onionlink_core::consts::BLAKE2_DIGEST_LENGTH;
use onionlink_core::{Error, RecoverableKind, Result};
use onionlink_crypto::{auth_and_decrypt, blake2b_digest, encrypt_and_sign, SymmetricKey};

/// Seals a plaintext for storage and verifies it on the way back.
pub trait Sealer {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Verify and unwrap a sealed blob. Content that fails verification is a
    /// recoverable error; the store decides whether to escalate.
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>>;
}

/// XChaCha20-Poly1305 under a database key.
#[derive(Debug, Clone)]
pub struct AeadSealer {
    key: SymmetricKey,
}

impl AeadSealer {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }
}

impl Sealer for AeadSealer {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt_and_sign(plaintext, &self.key, b"")
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        auth_and_decrypt(sealed, &self.key, b"")
    }
}

/// `payload || BLAKE2b-256(payload)`, for data stored before any key exists.
///
/// Detects corruption only; anyone who can write the file can forge it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestSealer;

impl Sealer for DigestSealer {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(plaintext.len() + BLAKE2_DIGEST_LENGTH);
        out.extend_from_slice(plaintext);
        out.extend_from_slice(&blake2b_digest(plaintext));
        Ok(out)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < BLAKE2_DIGEST_LENGTH {
            return Err(Error::recoverable(
                RecoverableKind::Checksum,
                format!("checksummed data too short ({} bytes)", sealed.len()),
            ));
        }

        let (payload, digest) = sealed.split_at(sealed.len() - BLAKE2_DIGEST_LENGTH);
        if blake2b_digest(payload) != digest {
            return Err(Error::recoverable(
                RecoverableKind::Checksum,
                "checksum of stored data does not match",
            ));
        }
        Ok(payload.to_vec())
    }
}
