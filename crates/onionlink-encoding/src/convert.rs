//! Fixed-width conversions for database record fields

use chrono::{DateTime, Utc};

use onionlink_core::consts::{
    ENCODED_BOOLEAN_LENGTH, ENCODED_FLOAT_LENGTH, ENCODED_INTEGER_LENGTH, TIMESTAMP_LENGTH,
};
use onionlink_core::{Error, FatalKind, Result};

fn fixed<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::fatal(
            FatalKind::InvalidLength,
            format!("encoded {what} must be {N} bytes (got {})", bytes.len()),
        )
    })
}

pub fn bool_to_bytes(value: bool) -> [u8; ENCODED_BOOLEAN_LENGTH] {
    [u8::from(value)]
}

/// Any non-zero byte decodes as `true`.
pub fn bytes_to_bool(bytes: &[u8]) -> Result<bool> {
    let [b] = fixed::<ENCODED_BOOLEAN_LENGTH>(bytes, "boolean")?;
    Ok(b != 0)
}

/// Unsigned 64-bit integer, big-endian.
pub fn int_to_bytes(value: u64) -> [u8; ENCODED_INTEGER_LENGTH] {
    value.to_be_bytes()
}

pub fn bytes_to_int(bytes: &[u8]) -> Result<u64> {
    fixed::<ENCODED_INTEGER_LENGTH>(bytes, "integer").map(u64::from_be_bytes)
}

/// IEEE-754 double in machine byte order.
pub fn double_to_bytes(value: f64) -> [u8; ENCODED_FLOAT_LENGTH] {
    value.to_ne_bytes()
}

pub fn bytes_to_double(bytes: &[u8]) -> Result<f64> {
    fixed::<ENCODED_FLOAT_LENGTH>(bytes, "float").map(f64::from_ne_bytes)
}

/// Unix timestamp as 4 little-endian bytes. Times outside the `u32` range
/// are rejected.
pub fn timestamp_to_bytes(time: DateTime<Utc>) -> Result<[u8; TIMESTAMP_LENGTH]> {
    let seconds = u32::try_from(time.timestamp()).map_err(|_| {
        Error::fatal(
            FatalKind::InvalidParameter,
            format!("timestamp {time} does not fit in 32 bits"),
        )
    })?;
    Ok(seconds.to_le_bytes())
}

pub fn bytes_to_timestamp(bytes: &[u8]) -> Result<DateTime<Utc>> {
    let seconds = fixed::<TIMESTAMP_LENGTH>(bytes, "timestamp").map(u32::from_le_bytes)?;
    DateTime::from_timestamp(i64::from(seconds), 0).ok_or_else(|| {
        Error::fatal(
            FatalKind::InvalidParameter,
            format!("timestamp {seconds} out of range"),
        )
    })
}
