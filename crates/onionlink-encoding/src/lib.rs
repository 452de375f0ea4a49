//! onionlink-encoding: canonical text encodings and fixed-width record fields
//!
//! - Base58Check for human-entered key material (network byte + SHA-256d checksum)
//! - Ascii85 and decimal renderings for compact / human-comparable output
//! - Self-describing padding of text fields to a fixed character count
//! - Fixed-width conversions for booleans, integers, floats and timestamps

pub mod base58;
pub mod convert;
pub mod text;
pub mod unicode;

pub use base58::{b58_decode, b58_encode, sha256d};
pub use convert::{
    bool_to_bytes, bytes_to_bool, bytes_to_double, bytes_to_int, bytes_to_timestamp,
    double_to_bytes, int_to_bytes, timestamp_to_bytes,
};
pub use text::{b10_encode, b85_encode};
pub use unicode::{bytes_to_str, remove_unicode_padding, str_to_bytes, unicode_padding};
