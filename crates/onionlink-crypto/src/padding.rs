//! Self-describing byte padding to multiples of [`PADDING_LENGTH`]
//!
//! `k` bytes of value `k` are appended, `1 <= k <= 255`. Input that is
//! already block-aligned gains a whole block, so padding is always present.

use onionlink_core::consts::PADDING_LENGTH;
use onionlink_core::{Error, FatalKind, Result};

pub fn byte_padding(data: &[u8]) -> Vec<u8> {
    let pad = PADDING_LENGTH - data.len() % PADDING_LENGTH;

    let mut padded = Vec::with_capacity(data.len() + pad);
    padded.extend_from_slice(data);
    // pad <= 255
    padded.resize(data.len() + pad, pad as u8);
    padded
}

pub fn remove_padding_bytes(padded: &[u8]) -> Result<Vec<u8>> {
    let &last = padded.last().ok_or_else(|| {
        Error::fatal(FatalKind::InvalidLength, "cannot remove padding from empty input")
    })?;

    let pad = usize::from(last);
    if pad == 0 || pad > PADDING_LENGTH || pad > padded.len() {
        return Err(Error::fatal(
            FatalKind::InvalidParameter,
            format!("invalid padding length {pad}"),
        ));
    }

    let (data, padding) = padded.split_at(padded.len() - pad);
    if padding.iter().any(|&b| b != last) {
        return Err(Error::fatal(
            FatalKind::InvalidParameter,
            "invalid padding bytes",
        ));
    }

    Ok(data.to_vec())
}
