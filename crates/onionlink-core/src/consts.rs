//! Protocol and storage constants

/// Symmetric key size (XChaCha20-Poly1305, BLAKE2b default digest)
pub const SYMMETRIC_KEY_LENGTH: usize = 32;
pub const XCHACHA20_NONCE_LENGTH: usize = 24;
pub const POLY1305_TAG_LENGTH: usize = 16;

pub const X448_PRIVATE_KEY_LENGTH: usize = 56;
pub const X448_PUBLIC_KEY_LENGTH: usize = 56;
pub const X448_SHARED_SECRET_LENGTH: usize = 56;

pub const FINGERPRINT_LENGTH: usize = 8;

pub const BLAKE2_DIGEST_LENGTH: usize = 32;
pub const BLAKE2_DIGEST_LENGTH_MIN: usize = 1;
pub const BLAKE2_DIGEST_LENGTH_MAX: usize = 64;
pub const BLAKE2_KEY_LENGTH_MAX: usize = 64;
pub const BLAKE2_SALT_LENGTH: usize = 16;
pub const BLAKE2_PERSON_LENGTH: usize = 16;

pub const ARGON2_SALT_LENGTH: usize = 32;
pub const ARGON2_MIN_TIME_COST: u32 = 1;
pub const ARGON2_MIN_MEMORY_COST: u32 = 8;
pub const ARGON2_MIN_PARALLELISM: u32 = 1;
pub const MIN_KEY_DERIVATION_TIME: f64 = 3.0;
pub const MAX_KEY_DERIVATION_TIME: f64 = 4.0;

/// Block size of byte padding and character count of padded text fields
pub const PADDING_LENGTH: usize = 255;
/// Byte length of a padded text field once encoded as UTF-32 with a BOM
pub const PADDED_UTF32_STR_LENGTH: usize = 1024;

pub const ENCODED_BOOLEAN_LENGTH: usize = 1;
pub const ENCODED_INTEGER_LENGTH: usize = 8;
pub const ENCODED_FLOAT_LENGTH: usize = 8;
pub const TIMESTAMP_LENGTH: usize = 4;

pub const B58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
pub const B58_CHECKSUM_LENGTH: usize = 4;
/// Network byte of base58-encoded local (private) key material
pub const MAINNET_HEADER: u8 = 0x80;
/// Network byte of base58-encoded public keys
pub const TESTNET_HEADER: u8 = 0xEF;

/// Domain tags for subkey derivation, zero-padded to BLAKE2b's personalization size
pub const MESSAGE_KEY: [u8; BLAKE2_PERSON_LENGTH] = *b"message_key\0\0\0\0\0";
pub const HEADER_KEY: [u8; BLAKE2_PERSON_LENGTH] = *b"header_key\0\0\0\0\0\0";
pub const FINGERPRINT: [u8; BLAKE2_PERSON_LENGTH] = *b"fingerprint\0\0\0\0\0";

pub const TEMP_SUFFIX: &str = "_temp";
pub const DB_WRITE_RETRY_LIMIT: usize = 10;

/// salt || key digest || time cost || memory cost || parallelism
pub const MASTERKEY_DB_SIZE: usize =
    ARGON2_SALT_LENGTH + BLAKE2_DIGEST_LENGTH + 3 * ENCODED_INTEGER_LENGTH;

pub const TRAFFIC_MASKING_MIN_STATIC_DELAY: f64 = 0.1;
pub const TRAFFIC_MASKING_MIN_RANDOM_DELAY: f64 = 0.1;
pub const NEW_MESSAGE_NOTIFY_MIN_DURATION: f64 = 0.05;
