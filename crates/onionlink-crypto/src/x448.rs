//! X448 key agreement

use zeroize::Zeroize;

use onionlink_core::consts::{
    SYMMETRIC_KEY_LENGTH, X448_PRIVATE_KEY_LENGTH, X448_PUBLIC_KEY_LENGTH,
    X448_SHARED_SECRET_LENGTH,
};
use onionlink_core::{Error, FatalKind, Result};

use crate::hash::{blake2b, HashParams};
use crate::keys::{csprng, SymmetricKey};

/// An X448 private key. Zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey {
    bytes: [u8; X448_PRIVATE_KEY_LENGTH],
}

/// An X448 public key, safe to display and transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    bytes: [u8; X448_PUBLIC_KEY_LENGTH],
}

/// Raw X448 agreement output.
///
/// Not uniformly random; the only way out is [`RawSharedSecret::into_shared_key`].
pub struct RawSharedSecret {
    bytes: [u8; X448_SHARED_SECRET_LENGTH],
}

/// Generate a new private key from the CSPRNG.
pub fn generate_private_key() -> Result<PrivateKey> {
    // 56 bytes fit in a single BLAKE2b output
    let mut random = csprng(X448_PRIVATE_KEY_LENGTH)?;
    let key = PrivateKey::from_slice(&random);
    random.zeroize();
    key
}

impl PrivateKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes = fixed_length(bytes, "private key")?;
        // reject anything the curve implementation would not accept
        x448::Secret::from_bytes(&bytes).ok_or_else(|| {
            Error::fatal(FatalKind::CryptoFailure, "invalid X448 private key")
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; X448_PRIVATE_KEY_LENGTH] {
        &self.bytes
    }

    fn secret(&self) -> Result<x448::Secret> {
        x448::Secret::from_bytes(&self.bytes)
            .ok_or_else(|| Error::fatal(FatalKind::CryptoFailure, "invalid X448 private key"))
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        let secret = self.secret()?;
        let public = x448::PublicKey::from(&secret);
        PublicKey::from_slice(public.as_bytes())
    }

    /// Compute the raw shared secret with a peer's public key.
    pub fn shared_secret(&self, peer: &PublicKey) -> Result<RawSharedSecret> {
        let secret = self.secret()?;
        let public = x448::PublicKey::from_bytes(&peer.bytes).ok_or_else(|| {
            Error::fatal(FatalKind::CryptoFailure, "invalid X448 public key")
        })?;
        let shared = secret.as_diffie_hellman(&public).ok_or_else(|| {
            Error::fatal(
                FatalKind::CryptoFailure,
                "X448 agreement failed: low-order public key",
            )
        })?;

        Ok(RawSharedSecret {
            bytes: fixed_length(shared.as_bytes(), "shared secret")?,
        })
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl PublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            bytes: fixed_length(bytes, "public key")?,
        })
    }

    pub fn as_bytes(&self) -> &[u8; X448_PUBLIC_KEY_LENGTH] {
        &self.bytes
    }
}

impl RawSharedSecret {
    /// Hash the agreement output into a uniformly random 256-bit key.
    pub fn into_shared_key(self) -> Result<SymmetricKey> {
        let mut digest = blake2b(
            &self.bytes,
            &HashParams::with_digest_size(SYMMETRIC_KEY_LENGTH),
        )?;
        let key = SymmetricKey::from_slice(&digest);
        digest.zeroize();
        key
    }
}

impl PartialEq for RawSharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Drop for RawSharedSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for RawSharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSharedSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

fn fixed_length<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::fatal(
            FatalKind::InvalidLength,
            format!("{what} must be {N} bytes (got {})", bytes.len()),
        )
    })
}
