//! XChaCha20-Poly1305 envelopes
//!
//! Envelope format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! ```
//!
//! The ciphertext is exactly as long as the plaintext. Associated data is
//! authenticated but not stored in the envelope.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};

use onionlink_core::consts::{POLY1305_TAG_LENGTH, XCHACHA20_NONCE_LENGTH};
use onionlink_core::{Error, FatalKind, RecoverableKind, Result};

use crate::keys::{csprng, SymmetricKey};

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// Returns: `[24-byte nonce][ciphertext][16-byte tag]`
pub fn encrypt_and_sign(plaintext: &[u8], key: &SymmetricKey, ad: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let nonce_bytes = csprng(XCHACHA20_NONCE_LENGTH)?;
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: ad,
            },
        )
        .map_err(|e| Error::fatal(FatalKind::CryptoFailure, format!("encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(XCHACHA20_NONCE_LENGTH + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Authenticate and decrypt an envelope produced by [`encrypt_and_sign`].
///
/// A truncated envelope is fatal. A tag that does not verify is a
/// recoverable authentication error: the caller decides whether to drop the
/// input or escalate.
pub fn auth_and_decrypt(envelope: &[u8], key: &SymmetricKey, ad: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < XCHACHA20_NONCE_LENGTH + POLY1305_TAG_LENGTH {
        return Err(Error::fatal(
            FatalKind::InvalidLength,
            format!(
                "invalid ciphertext length: {} bytes (minimum {})",
                envelope.len(),
                XCHACHA20_NONCE_LENGTH + POLY1305_TAG_LENGTH
            ),
        ));
    }

    let (nonce_bytes, ct_tag) = envelope.split_at(XCHACHA20_NONCE_LENGTH);
    let nonce = XNonce::from_slice(nonce_bytes);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ct_tag,
                aad: ad,
            },
        )
        .map_err(|_| {
            Error::recoverable(
                RecoverableKind::Authentication,
                "decryption failed: invalid key or corrupted data",
            )
        })
}

/// [`auth_and_decrypt`] for content read from the named database.
///
/// Authentication failure here means the stored data itself is corrupt and
/// is escalated to a fatal error.
pub fn auth_and_decrypt_database(
    envelope: &[u8],
    key: &SymmetricKey,
    database: &str,
    ad: &[u8],
) -> Result<Vec<u8>> {
    auth_and_decrypt(envelope, key, ad).map_err(|e| e.escalate(database))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(byte: u8) -> SymmetricKey {
        SymmetricKey::from_bytes([byte; 32])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = key(1);
        let plaintext = b"hello, encrypted world!";

        let envelope = encrypt_and_sign(plaintext, &key, b"").unwrap();
        assert_eq!(
            envelope.len(),
            XCHACHA20_NONCE_LENGTH + plaintext.len() + POLY1305_TAG_LENGTH
        );

        let decrypted = auth_and_decrypt(&envelope, &key, b"").unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = key(2);
        let envelope = encrypt_and_sign(b"", &key, b"").unwrap();
        assert_eq!(envelope.len(), XCHACHA20_NONCE_LENGTH + POLY1305_TAG_LENGTH);
        assert!(auth_and_decrypt(&envelope, &key, b"").unwrap().is_empty());
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let key = key(3);
        let a = encrypt_and_sign(b"same", &key, b"").unwrap();
        let b = encrypt_and_sign(b"same", &key, b"").unwrap();
        assert_ne!(a[..XCHACHA20_NONCE_LENGTH], b[..XCHACHA20_NONCE_LENGTH]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_is_recoverable() {
        let envelope = encrypt_and_sign(b"secret", &key(4), b"").unwrap();
        let err = auth_and_decrypt(&envelope, &key(5), b"").unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.recoverable_kind(), Some(RecoverableKind::Authentication));
    }

    #[test]
    fn test_associated_data_is_authenticated() {
        let key = key(6);
        let envelope = encrypt_and_sign(b"payload", &key, b"header-a").unwrap();
        assert!(auth_and_decrypt(&envelope, &key, b"header-a").is_ok());
        assert!(auth_and_decrypt(&envelope, &key, b"header-b").is_err());
        assert!(auth_and_decrypt(&envelope, &key, b"").is_err());
    }

    #[test]
    fn test_too_short_is_fatal() {
        let err = auth_and_decrypt(&[0u8; 39], &key(7), b"").unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidLength));
    }

    #[test]
    fn test_database_failure_escalates() {
        let envelope = encrypt_and_sign(b"row", &key(8), b"").unwrap();
        let err = auth_and_decrypt_database(&envelope, &key(9), "user_data/tx_log", b"").unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::CorruptDatabase));
        assert!(err.to_string().contains("user_data/tx_log"));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let key = key(10);
            let envelope = encrypt_and_sign(&data, &key, b"").unwrap();
            prop_assert_eq!(auth_and_decrypt(&envelope, &key, b"").unwrap(), data);
        }

        #[test]
        fn prop_bit_flip_rejected(
            data in proptest::collection::vec(any::<u8>(), 0..256),
            position in any::<proptest::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = key(11);
            let mut envelope = encrypt_and_sign(&data, &key, b"").unwrap();
            let i = position.index(envelope.len());
            envelope[i] ^= 1 << bit;

            let err = auth_and_decrypt(&envelope, &key, b"").unwrap_err();
            prop_assert_eq!(err.recoverable_kind(), Some(RecoverableKind::Authentication));
        }
    }
}
