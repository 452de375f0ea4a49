//! onionlink-crypto: cryptographic primitives of the endpoint
//!
//! Key hierarchy:
//! ```text
//! Password ──Argon2i──▶ Master Key (256-bit, encrypts every database)
//!
//! X448 private key ─┐
//!                   ├─ X448 ─▶ raw shared secret (56 B) ─BLAKE2b─▶ Shared Key (256-bit)
//! peer public key ──┘                                                 │
//!            BLAKE2b(key = Shared Key, personalization = domain tag) ─┘
//!              ├── tx/rx message keys   ("message_key", 32 B)
//!              ├── tx/rx header keys    ("header_key",  32 B)
//!              └── tx/rx fingerprints   ("fingerprint",  8 B)
//! ```
//!
//! Everything at rest is an XChaCha20-Poly1305 envelope:
//! `[24-byte nonce][ciphertext][16-byte tag]`.

pub mod aead;
pub mod hash;
pub mod kdf;
pub mod keys;
pub mod padding;
pub mod subkeys;
pub mod x448;

pub use aead::{auth_and_decrypt, auth_and_decrypt_database, encrypt_and_sign};
pub use hash::{blake2b, blake2b_digest, HashParams};
pub use kdf::{argon2_kdf, calibrate_time_cost, KdfParams};
pub use keys::{csprng, SymmetricKey};
pub use padding::{byte_padding, remove_padding_bytes};
pub use subkeys::{derive_subkeys, format_fingerprint, Subkeys};
pub use x448::{generate_private_key, PrivateKey, PublicKey, RawSharedSecret};

pub use onionlink_core::consts::{
    POLY1305_TAG_LENGTH as TAG_SIZE, SYMMETRIC_KEY_LENGTH as KEY_SIZE,
    XCHACHA20_NONCE_LENGTH as NONCE_SIZE,
};
