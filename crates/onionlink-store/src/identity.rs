//! The local X448 identity, persisted through the encrypted store

use std::path::{Path, PathBuf};

use zeroize::Zeroize;

use onionlink_core::Result;
use onionlink_crypto::{derive_subkeys, generate_private_key, PrivateKey, PublicKey, Subkeys, SymmetricKey};
use onionlink_encoding::b58_encode;

use crate::blob::BlobStore;
use crate::medium::{DiskMedium, Medium};
use crate::sealer::AeadSealer;

#[derive(Debug)]
pub struct LocalIdentity {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl LocalIdentity {
    pub fn generate() -> Result<Self> {
        Self::from_private_key(generate_private_key()?)
    }

    pub fn from_private_key(private_key: PrivateKey) -> Result<Self> {
        let public_key = private_key.public_key()?;
        Ok(Self {
            private_key,
            public_key,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Public key in the base58 form users exchange.
    pub fn b58_public_key(&self) -> String {
        b58_encode(self.public_key.as_bytes(), true)
    }

    /// Run the key agreement with `contact` and expand it into subkeys.
    pub fn subkeys_with(&self, contact: &PublicKey) -> Result<Subkeys> {
        let shared_key = self.private_key.shared_secret(contact)?.into_shared_key()?;
        derive_subkeys(&shared_key, &self.public_key, contact)
    }
}

/// The `<operation>_identity` database.
pub struct IdentityDb<M = DiskMedium> {
    db: BlobStore<AeadSealer, M>,
}

impl IdentityDb<DiskMedium> {
    pub fn new(path: impl Into<PathBuf>, key: SymmetricKey) -> Self {
        Self {
            db: BlobStore::new(path, AeadSealer::new(key)),
        }
    }
}

impl<M: Medium> IdentityDb<M> {
    pub fn with_store(db: BlobStore<AeadSealer, M>) -> Self {
        Self { db }
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Load the stored identity, or generate and store one on first run.
    pub fn load_or_create(&self) -> Result<LocalIdentity> {
        self.db.recover()?;
        if self.db.exists() {
            return self.load();
        }

        tracing::info!(database = %self.db.path().display(), "generating local identity");
        let identity = LocalIdentity::generate()?;
        self.store(&identity)?;
        Ok(identity)
    }

    pub fn load(&self) -> Result<LocalIdentity> {
        let mut plaintext = self.db.load()?;
        let private_key = PrivateKey::from_slice(&plaintext);
        plaintext.zeroize();
        LocalIdentity::from_private_key(private_key?)
    }

    pub fn store(&self, identity: &LocalIdentity) -> Result<()> {
        self.db.store(identity.private_key.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onionlink_encoding::b58_decode;
    use tempfile::TempDir;

    #[test]
    fn test_identity_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_identity");
        let key = SymmetricKey::from_bytes([4; 32]);

        let created = IdentityDb::new(&path, key.clone()).load_or_create().unwrap();
        let loaded = IdentityDb::new(&path, key).load_or_create().unwrap();
        assert_eq!(created.public_key(), loaded.public_key());
        assert_eq!(created.private_key().as_bytes(), loaded.private_key().as_bytes());
    }

    #[test]
    fn test_private_key_is_encrypted_at_rest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_identity");
        let identity = IdentityDb::new(&path, SymmetricKey::from_bytes([4; 32]))
            .load_or_create()
            .unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(raw.len(), 24 + 56 + 16);
        assert!(!raw
            .windows(56)
            .any(|w| w == identity.private_key().as_bytes()));
    }

    #[test]
    fn test_b58_public_key_roundtrip() {
        let identity = LocalIdentity::generate().unwrap();
        let decoded = b58_decode(&identity.b58_public_key(), true).unwrap();
        assert_eq!(&decoded[..], identity.public_key().as_bytes());
    }

    #[test]
    fn test_fingerprints_match_between_peers() {
        let alice = LocalIdentity::generate().unwrap();
        let bob = LocalIdentity::generate().unwrap();

        let a = alice.subkeys_with(bob.public_key()).unwrap();
        let b = bob.subkeys_with(alice.public_key()).unwrap();
        assert_eq!(a.tx_fp, b.rx_fp);
        assert_eq!(a.tx_mk, b.rx_mk);
    }
}
