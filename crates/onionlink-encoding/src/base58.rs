//! Base58Check encoding of key material
//!
//! Encoded layout (before base58):
//! ```text
//! [1 byte: network byte][N bytes: data][4 bytes: SHA-256d(network byte || data)[..4]]
//! ```
//!
//! The network byte separates the two key categories so a public key pasted
//! into a local-key prompt (or vice versa) is rejected instead of accepted.

use sha2::{Digest, Sha256};

use onionlink_core::consts::{B58_CHECKSUM_LENGTH, MAINNET_HEADER, TESTNET_HEADER};
use onionlink_core::{Error, RecoverableKind, Result};

/// Double SHA-256, as used by the Base58Check checksum.
pub fn sha256d(message: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(message);
    Sha256::digest(first).into()
}

fn network_byte(public_key: bool) -> u8 {
    if public_key {
        TESTNET_HEADER
    } else {
        MAINNET_HEADER
    }
}

/// Encode `data` as Base58Check with the network byte of its key category.
pub fn b58_encode(data: &[u8], public_key: bool) -> String {
    let mut payload = Vec::with_capacity(1 + data.len() + B58_CHECKSUM_LENGTH);
    payload.push(network_byte(public_key));
    payload.extend_from_slice(data);

    let checksum = sha256d(&payload);
    payload.extend_from_slice(&checksum[..B58_CHECKSUM_LENGTH]);

    bs58::encode(payload).into_string()
}

/// Decode a Base58Check string produced by [`b58_encode`].
///
/// Fails with a recoverable error on characters outside the alphabet, a
/// checksum mismatch, or a network byte of the other key category.
pub fn b58_decode(text: &str, public_key: bool) -> Result<Vec<u8>> {
    let decoded = bs58::decode(text).into_vec().map_err(|e| {
        Error::recoverable(RecoverableKind::Encoding, format!("invalid base58 string: {e}"))
    })?;

    if decoded.len() < 1 + B58_CHECKSUM_LENGTH {
        return Err(Error::recoverable(
            RecoverableKind::Checksum,
            "invalid checksum",
        ));
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - B58_CHECKSUM_LENGTH);
    if sha256d(payload)[..B58_CHECKSUM_LENGTH] != *checksum {
        return Err(Error::recoverable(
            RecoverableKind::Checksum,
            "invalid checksum",
        ));
    }

    if payload[0] != network_byte(public_key) {
        return Err(Error::recoverable(
            RecoverableKind::NetworkByte,
            "invalid network ID",
        ));
    }

    Ok(payload[1..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use onionlink_core::consts::B58_ALPHABET;
    use proptest::prelude::*;

    #[test]
    fn test_sha256d_length_and_determinism() {
        let h1 = sha256d(b"hello");
        let h2 = sha256d(b"hello");
        assert_eq!(h1.len(), 32);
        assert_eq!(h1, h2);
        assert_ne!(h1, sha256d(b"hellp"));
    }

    #[test]
    fn test_roundtrip_local_key() {
        let original: Vec<u8> = (0u8..32).collect();
        let encoded = b58_encode(&original, false);
        assert_eq!(b58_decode(&encoded, false).unwrap(), original);
    }

    #[test]
    fn test_roundtrip_public_key() {
        let original: Vec<u8> = (100u8..156).collect();
        let encoded = b58_encode(&original, true);
        assert_eq!(b58_decode(&encoded, true).unwrap(), original);
    }

    #[test]
    fn test_encoded_uses_alphabet() {
        let encoded = b58_encode(&[0u8; 32], false);
        assert!(encoded.chars().all(|c| B58_ALPHABET.contains(c)));
    }

    #[test]
    fn test_short_input_fails_checksum() {
        let err = b58_decode("111111", false).unwrap_err();
        assert_eq!(err.recoverable_kind(), Some(RecoverableKind::Checksum));
    }

    #[test]
    fn test_wrong_category_rejected() {
        let encoded = b58_encode(&[7u8; 56], true);
        let err = b58_decode(&encoded, false).unwrap_err();
        assert_eq!(err.recoverable_kind(), Some(RecoverableKind::NetworkByte));
    }

    #[test]
    fn test_invalid_character_rejected() {
        // '0', 'O', 'I' and 'l' are not part of the alphabet
        let err = b58_decode("0OIl", false).unwrap_err();
        assert_eq!(err.recoverable_kind(), Some(RecoverableKind::Encoding));
    }

    proptest! {
        #[test]
        fn roundtrip_both_categories(
            data in proptest::collection::vec(any::<u8>(), 0..=64),
            public_key in any::<bool>(),
        ) {
            let encoded = b58_encode(&data, public_key);
            prop_assert_eq!(b58_decode(&encoded, public_key).unwrap(), data);
        }

        #[test]
        fn single_character_corruption_fails_checksum(
            data in proptest::collection::vec(any::<u8>(), 32..=56),
            index in any::<prop::sample::Index>(),
            shift in 1usize..58,
        ) {
            let encoded = b58_encode(&data, true);
            let alphabet: Vec<char> = B58_ALPHABET.chars().collect();

            let mut chars: Vec<char> = encoded.chars().collect();
            let i = index.index(chars.len());
            let pos = alphabet.iter().position(|&c| c == chars[i]).unwrap();
            chars[i] = alphabet[(pos + shift) % alphabet.len()];
            let corrupted: String = chars.into_iter().collect();

            let err = b58_decode(&corrupted, true).unwrap_err();
            prop_assert_eq!(err.recoverable_kind(), Some(RecoverableKind::Checksum));
        }
    }
}
