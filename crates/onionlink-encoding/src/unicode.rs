//! Fixed-size text fields
//!
//! Text is padded to exactly [`PADDING_LENGTH`] characters by appending `k`
//! copies of the character whose code point is `k`. The padding describes
//! itself, so no length field is stored. For database records the padded text
//! is stored as UTF-32BE behind a byte-order mark:
//! ```text
//! [4 bytes: U+FEFF][255 x 4 bytes: padded characters]   = 1024 bytes
//! ```

use onionlink_core::consts::{PADDED_UTF32_STR_LENGTH, PADDING_LENGTH};
use onionlink_core::{Error, FatalKind, RecoverableKind, Result};

const BOM: char = '\u{FEFF}';

/// Pad `text` to exactly [`PADDING_LENGTH`] characters.
pub fn unicode_padding(text: &str) -> Result<String> {
    let len = text.chars().count();
    if len >= PADDING_LENGTH {
        return Err(Error::recoverable(
            RecoverableKind::InvalidInput,
            format!("text of {len} characters does not fit a {PADDING_LENGTH} character field"),
        ));
    }

    let pad = PADDING_LENGTH - len;
    // pad is in 1..=255, always a valid scalar value
    let pad_char = char::from_u32(pad as u32).ok_or_else(|| {
        Error::fatal(FatalKind::InvalidParameter, "invalid padding character")
    })?;

    let mut padded = String::with_capacity(text.len() + pad * 2);
    padded.push_str(text);
    padded.extend(std::iter::repeat(pad_char).take(pad));
    Ok(padded)
}

/// Strip the padding added by [`unicode_padding`].
pub fn remove_unicode_padding(padded: &str) -> Result<String> {
    let chars: Vec<char> = padded.chars().collect();
    let invalid = || Error::recoverable(RecoverableKind::Padding, "invalid text padding");

    let last = *chars.last().ok_or_else(invalid)?;
    let pad = last as usize;
    if pad == 0 || pad > PADDING_LENGTH || pad > chars.len() {
        return Err(invalid());
    }
    if chars[chars.len() - pad..].iter().any(|&c| c != last) {
        return Err(invalid());
    }

    Ok(chars[..chars.len() - pad].iter().collect())
}

/// Pad `text` and encode it as a fixed 1024-byte record.
pub fn str_to_bytes(text: &str) -> Result<Vec<u8>> {
    let padded = unicode_padding(text)?;

    let mut out = Vec::with_capacity(PADDED_UTF32_STR_LENGTH);
    out.extend_from_slice(&u32::from(BOM).to_be_bytes());
    for c in padded.chars() {
        out.extend_from_slice(&u32::from(c).to_be_bytes());
    }

    if out.len() != PADDED_UTF32_STR_LENGTH {
        return Err(Error::fatal(
            FatalKind::InvalidLength,
            format!("padded text record has invalid length ({} bytes)", out.len()),
        ));
    }
    Ok(out)
}

/// Decode a record produced by [`str_to_bytes`].
pub fn bytes_to_str(bytes: &[u8]) -> Result<String> {
    if bytes.len() != PADDED_UTF32_STR_LENGTH {
        return Err(Error::fatal(
            FatalKind::InvalidLength,
            format!(
                "text record must be {PADDED_UTF32_STR_LENGTH} bytes (got {})",
                bytes.len()
            ),
        ));
    }

    let mut chars = bytes.chunks_exact(4).map(|word| {
        let code = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
        char::from_u32(code).ok_or_else(|| {
            Error::recoverable(
                RecoverableKind::Encoding,
                format!("invalid code point {code:#x} in text record"),
            )
        })
    });

    if chars.next().transpose()? != Some(BOM) {
        return Err(Error::recoverable(
            RecoverableKind::Encoding,
            "text record is missing its byte-order mark",
        ));
    }

    let padded = chars.collect::<Result<String>>()?;
    remove_unicode_padding(&padded)
}
