//! Subkey derivation from an X448 shared key
//!
//! Each party's tx keys hash the contact's public key and its tx fingerprint
//! hashes its own, so one side's tx values equal the other side's rx values
//! without any further exchange.

use onionlink_core::consts::{
    FINGERPRINT, FINGERPRINT_LENGTH, HEADER_KEY, MESSAGE_KEY, SYMMETRIC_KEY_LENGTH,
};
use onionlink_core::{Error, FatalKind, Result};
use onionlink_encoding::b10_encode;

use crate::hash::{blake2b, HashParams};
use crate::keys::SymmetricKey;
use crate::x448::PublicKey;

/// Digits in a rendered fingerprint (`u64::MAX` has 20)
const FINGERPRINT_DIGITS: usize = 20;
const FINGERPRINT_GROUP: usize = 5;

/// Directional keys and fingerprints shared with one contact.
#[derive(Debug)]
pub struct Subkeys {
    pub tx_mk: SymmetricKey,
    pub rx_mk: SymmetricKey,
    pub tx_hk: SymmetricKey,
    pub rx_hk: SymmetricKey,
    pub tx_fp: [u8; FINGERPRINT_LENGTH],
    pub rx_fp: [u8; FINGERPRINT_LENGTH],
}

fn keyed_hash(
    message: &[u8],
    key: &SymmetricKey,
    personalization: &[u8],
    digest_size: usize,
) -> Result<Vec<u8>> {
    blake2b(
        message,
        &HashParams {
            key: Some(key.as_bytes()),
            personalization: Some(personalization),
            digest_size,
            ..HashParams::default()
        },
    )
}

/// Expand `shared_key` into the six per-contact subkeys.
///
/// Fails with a fatal key collision if any two outputs are equal.
pub fn derive_subkeys(
    shared_key: &SymmetricKey,
    user: &PublicKey,
    contact: &PublicKey,
) -> Result<Subkeys> {
    let user = user.as_bytes();
    let contact = contact.as_bytes();

    let tx_mk = keyed_hash(contact, shared_key, &MESSAGE_KEY, SYMMETRIC_KEY_LENGTH)?;
    let rx_mk = keyed_hash(user, shared_key, &MESSAGE_KEY, SYMMETRIC_KEY_LENGTH)?;
    let tx_hk = keyed_hash(contact, shared_key, &HEADER_KEY, SYMMETRIC_KEY_LENGTH)?;
    let rx_hk = keyed_hash(user, shared_key, &HEADER_KEY, SYMMETRIC_KEY_LENGTH)?;
    let tx_fp = keyed_hash(user, shared_key, &FINGERPRINT, FINGERPRINT_LENGTH)?;
    let rx_fp = keyed_hash(contact, shared_key, &FINGERPRINT, FINGERPRINT_LENGTH)?;

    let all = [&tx_mk, &rx_mk, &tx_hk, &rx_hk, &tx_fp, &rx_fp];
    for (i, a) in all.iter().enumerate() {
        if all[i + 1..].iter().any(|b| a == b) {
            return Err(Error::fatal(
                FatalKind::KeyCollision,
                "derived subkeys were not unique",
            ));
        }
    }

    let fingerprint = |bytes: &[u8]| -> Result<[u8; FINGERPRINT_LENGTH]> {
        bytes.try_into().map_err(|_| {
            Error::fatal(FatalKind::InvalidLength, "fingerprint has invalid length")
        })
    };

    Ok(Subkeys {
        tx_mk: SymmetricKey::from_slice(&tx_mk)?,
        rx_mk: SymmetricKey::from_slice(&rx_mk)?,
        tx_hk: SymmetricKey::from_slice(&tx_hk)?,
        rx_hk: SymmetricKey::from_slice(&rx_hk)?,
        tx_fp: fingerprint(&tx_fp)?,
        rx_fp: fingerprint(&rx_fp)?,
    })
}

/// Render a fingerprint as four space-separated groups of five digits.
pub fn format_fingerprint(fingerprint: &[u8; FINGERPRINT_LENGTH]) -> String {
    let digits = format!("{:0>width$}", b10_encode(fingerprint), width = FINGERPRINT_DIGITS);
    digits
        .as_bytes()
        .chunks(FINGERPRINT_GROUP)
        .map(|group| String::from_utf8_lossy(group).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
