//! Master key change across every database of one profile
//!
//! All databases are first staged under the new key. The new login record is
//! the commit point: until it is written the old key still opens everything
//! and the staged temp files fail verification and are discarded on the next
//! load; once it is written the staged files verify under the new key and are
//! promoted even if the commits below are interrupted.

use secrecy::SecretString;
use zeroize::Zeroize;

use onionlink_core::Result;
use onionlink_crypto::{KdfParams, SymmetricKey};

use crate::blob::BlobStore;
use crate::log::MessageLog;
use crate::masterkey::{MasterKeyDb, MasterKeyRecord};
use crate::sealer::{AeadSealer, DigestSealer};
use crate::Profile;

/// Replace the master key of `profile` with one derived from `new_password`.
///
/// `old_key` must be the currently active master key. Every database write
/// is attempted at most `retry_limit` times. Returns the new key.
pub fn change_master_key(
    profile: &Profile,
    old_key: &SymmetricKey,
    new_password: &SecretString,
    params: KdfParams,
    retry_limit: usize,
) -> Result<SymmetricKey> {
    let (new_key, record) = MasterKeyRecord::derive(new_password, params)?;

    let mut staged = Vec::new();
    for path in [profile.settings_path(), profile.identity_path()] {
        let old =
            BlobStore::new(&path, AeadSealer::new(old_key.clone())).with_retry_limit(retry_limit);
        old.recover()?;
        if !old.exists() {
            continue;
        }

        let mut plaintext = old.load()?;
        let new =
            BlobStore::new(&path, AeadSealer::new(new_key.clone())).with_retry_limit(retry_limit);
        let result = new.stage(&plaintext);
        plaintext.zeroize();
        result?;
        staged.push(new);
    }

    let mut log = if profile.log_path().exists() {
        let mut log =
            MessageLog::open(profile.log_path(), old_key.clone())?.with_retry_limit(retry_limit);
        log.stage_rewrite(|_| true, Some(new_key.clone()))?;
        Some(log)
    } else {
        None
    };

    let login = BlobStore::new(profile.login_path(), DigestSealer).with_retry_limit(retry_limit);
    MasterKeyDb::with_store(login).store(&record)?;
    tracing::info!("stored login record for the new master key");

    for db in &staged {
        db.commit()?;
    }
    if let Some(log) = log.as_mut() {
        log.commit_rewrite()?;
    }

    Ok(new_key)
}
