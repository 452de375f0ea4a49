//! BLAKE2b hashing with optional key, salt and personalization
//!
//! Personalization is what turns one key into several independent derivation
//! contexts; subkey derivation relies on it.

use onionlink_core::consts::{
    BLAKE2_DIGEST_LENGTH, BLAKE2_DIGEST_LENGTH_MAX, BLAKE2_DIGEST_LENGTH_MIN,
    BLAKE2_KEY_LENGTH_MAX, BLAKE2_PERSON_LENGTH, BLAKE2_SALT_LENGTH,
};
use onionlink_core::{Error, FatalKind, Result};

/// Optional inputs of [`blake2b`].
#[derive(Debug, Clone, Copy)]
pub struct HashParams<'a> {
    /// MAC key, at most 64 bytes
    pub key: Option<&'a [u8]>,
    /// Exactly 16 bytes when present
    pub salt: Option<&'a [u8]>,
    /// Exactly 16 bytes when present
    pub personalization: Option<&'a [u8]>,
    /// Output length, 1..=64 bytes (default: 32)
    pub digest_size: usize,
}

impl Default for HashParams<'_> {
    fn default() -> Self {
        Self {
            key: None,
            salt: None,
            personalization: None,
            digest_size: BLAKE2_DIGEST_LENGTH,
        }
    }
}

impl<'a> HashParams<'a> {
    pub fn with_digest_size(digest_size: usize) -> Self {
        Self {
            digest_size,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !(BLAKE2_DIGEST_LENGTH_MIN..=BLAKE2_DIGEST_LENGTH_MAX).contains(&self.digest_size) {
            return Err(Error::fatal(
                FatalKind::InvalidParameter,
                format!(
                    "digest size must be between {BLAKE2_DIGEST_LENGTH_MIN} and {BLAKE2_DIGEST_LENGTH_MAX} bytes (got {})",
                    self.digest_size
                ),
            ));
        }
        if let Some(salt) = self.salt {
            if salt.len() != BLAKE2_SALT_LENGTH {
                return Err(Error::fatal(
                    FatalKind::InvalidLength,
                    format!("salt must be exactly {BLAKE2_SALT_LENGTH} bytes (got {})", salt.len()),
                ));
            }
        }
        if let Some(person) = self.personalization {
            if person.len() != BLAKE2_PERSON_LENGTH {
                return Err(Error::fatal(
                    FatalKind::InvalidLength,
                    format!(
                        "personalization must be exactly {BLAKE2_PERSON_LENGTH} bytes (got {})",
                        person.len()
                    ),
                ));
            }
        }
        if let Some(key) = self.key {
            if key.len() > BLAKE2_KEY_LENGTH_MAX {
                return Err(Error::fatal(
                    FatalKind::InvalidLength,
                    format!("key length cannot exceed {BLAKE2_KEY_LENGTH_MAX} bytes (got {})", key.len()),
                ));
            }
        }
        Ok(())
    }
}

/// Compute the BLAKE2b hash of `message` under `params`.
pub fn blake2b(message: &[u8], params: &HashParams<'_>) -> Result<Vec<u8>> {
    params.validate()?;

    let mut state = blake2b_simd::Params::new();
    state.hash_length(params.digest_size);
    if let Some(key) = params.key {
        state.key(key);
    }
    if let Some(salt) = params.salt {
        state.salt(salt);
    }
    if let Some(person) = params.personalization {
        state.personal(person);
    }

    Ok(state.hash(message).as_bytes().to_vec())
}

/// Keyless 32-byte BLAKE2b digest.
pub fn blake2b_digest(message: &[u8]) -> [u8; BLAKE2_DIGEST_LENGTH] {
    let hash = blake2b_simd::Params::new()
        .hash_length(BLAKE2_DIGEST_LENGTH)
        .hash(message);
    let mut out = [0u8; BLAKE2_DIGEST_LENGTH];
    out.copy_from_slice(hash.as_bytes());
    out
}
