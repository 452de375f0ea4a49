//! Login record: the salt and parameters needed to re-derive the master key
//!
//! Stored unencrypted (there is no key yet) behind a BLAKE2b checksum:
//! ```text
//! [32 bytes: Argon2 salt][32 bytes: BLAKE2b(master key)]
//! [8 bytes: time cost][8 bytes: memory cost][8 bytes: parallelism]   (big-endian)
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use secrecy::SecretString;

use onionlink_core::consts::{
    ARGON2_MIN_TIME_COST, ARGON2_SALT_LENGTH, BLAKE2_DIGEST_LENGTH, ENCODED_INTEGER_LENGTH,
    MASTERKEY_DB_SIZE,
};
use onionlink_core::{Error, FatalKind, RecoverableKind, Result};
use onionlink_crypto::{argon2_kdf, blake2b_digest, calibrate_time_cost, csprng, KdfParams, SymmetricKey};
use onionlink_encoding::{bytes_to_int, int_to_bytes};

use crate::blob::BlobStore;
use crate::medium::{DiskMedium, Medium};
use crate::sealer::DigestSealer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKeyRecord {
    pub salt: [u8; ARGON2_SALT_LENGTH],
    pub key_digest: [u8; BLAKE2_DIGEST_LENGTH],
    pub params: KdfParams,
}

impl MasterKeyRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MASTERKEY_DB_SIZE);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.key_digest);
        out.extend_from_slice(&int_to_bytes(u64::from(self.params.time_cost)));
        out.extend_from_slice(&int_to_bytes(u64::from(self.params.memory_cost_kib)));
        out.extend_from_slice(&int_to_bytes(u64::from(self.params.parallelism)));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != MASTERKEY_DB_SIZE {
            return Err(Error::fatal(
                FatalKind::InvalidLength,
                format!(
                    "login record must be {MASTERKEY_DB_SIZE} bytes (got {})",
                    bytes.len()
                ),
            ));
        }

        let (salt, rest) = bytes.split_at(ARGON2_SALT_LENGTH);
        let (digest, rest) = rest.split_at(BLAKE2_DIGEST_LENGTH);
        let cost = |index: usize| -> Result<u32> {
            let start = index * ENCODED_INTEGER_LENGTH;
            let value = bytes_to_int(&rest[start..start + ENCODED_INTEGER_LENGTH])?;
            u32::try_from(value).map_err(|_| {
                Error::fatal(
                    FatalKind::InvalidParameter,
                    format!("key derivation parameter {value} out of range"),
                )
            })
        };

        let params = KdfParams {
            time_cost: cost(0)?,
            memory_cost_kib: cost(1)?,
            parallelism: cost(2)?,
        };

        let mut record = Self {
            salt: [0; ARGON2_SALT_LENGTH],
            key_digest: [0; BLAKE2_DIGEST_LENGTH],
            params,
        };
        record.salt.copy_from_slice(salt);
        record.key_digest.copy_from_slice(digest);
        Ok(record)
    }

    /// Derive a fresh master key under a new random salt.
    pub fn derive(password: &SecretString, params: KdfParams) -> Result<(SymmetricKey, Self)> {
        let random = csprng(ARGON2_SALT_LENGTH)?;
        let mut salt = [0u8; ARGON2_SALT_LENGTH];
        salt.copy_from_slice(&random);

        let key = argon2_kdf(password, &salt, &params)?;
        let record = Self {
            salt,
            key_digest: blake2b_digest(key.as_bytes()),
            params,
        };
        Ok((key, record))
    }
}

/// Pick Argon2 parameters whose derivation takes between `min` and `max` on
/// this machine.
pub fn calibrate_params(
    memory_cost_kib: u32,
    parallelism: u32,
    min: Duration,
    max: Duration,
) -> Result<KdfParams> {
    let password = SecretString::from("calibration");
    let random = csprng(ARGON2_SALT_LENGTH)?;

    let time_cost = calibrate_time_cost(ARGON2_MIN_TIME_COST, min, max, |time_cost| {
        let params = KdfParams {
            time_cost,
            memory_cost_kib,
            parallelism,
        };
        let start = Instant::now();
        argon2_kdf(&password, &random, &params)?;
        Ok(start.elapsed())
    })?;

    tracing::info!(time_cost, memory_cost_kib, parallelism, "calibrated key derivation");
    Ok(KdfParams {
        time_cost,
        memory_cost_kib,
        parallelism,
    })
}

/// The `<operation>_login_data` database.
pub struct MasterKeyDb<M = DiskMedium> {
    db: BlobStore<DigestSealer, M>,
}

impl MasterKeyDb<DiskMedium> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            db: BlobStore::new(path, DigestSealer),
        }
    }
}

impl<M: Medium> MasterKeyDb<M> {
    pub fn with_store(db: BlobStore<DigestSealer, M>) -> Self {
        Self { db }
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Whether a login record exists, after resolving an interrupted write.
    pub fn exists(&self) -> Result<bool> {
        self.db.recover()?;
        Ok(self.db.exists())
    }

    /// Derive a new master key from `password` and store its login record.
    pub fn create(&self, password: &SecretString, params: KdfParams) -> Result<SymmetricKey> {
        let (key, record) = MasterKeyRecord::derive(password, params)?;
        self.store(&record)?;
        tracing::info!(database = %self.db.path().display(), "created login record");
        Ok(key)
    }

    pub fn store(&self, record: &MasterKeyRecord) -> Result<()> {
        self.db.store(&record.to_bytes())
    }

    pub fn load(&self) -> Result<MasterKeyRecord> {
        MasterKeyRecord::from_bytes(&self.db.load()?)
    }

    /// Re-derive the master key. A wrong password is recoverable.
    pub fn unlock(&self, password: &SecretString) -> Result<SymmetricKey> {
        let record = self.load()?;
        let key = argon2_kdf(password, &record.salt, &record.params)?;

        if blake2b_digest(key.as_bytes()) != record.key_digest {
            return Err(Error::recoverable(
                RecoverableKind::Authentication,
                "incorrect password",
            ));
        }
        Ok(key)
    }
}
