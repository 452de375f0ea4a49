//! onionlink-store: crash-consistent databases
//!
//! Every database of a profile lives under one data directory:
//! ```text
//! <data_dir>/<operation>_login_data   checksummed, Argon2 salt + parameters
//! <data_dir>/<operation>_settings     encrypted, fixed-layout settings record
//! <data_dir>/<operation>_identity     encrypted, X448 private key
//! <data_dir>/<operation>_log          SQLite, one encrypted row per entry
//! ```
//! Each may be accompanied by a `_temp` sibling while a write is in flight.

pub mod blob;
pub mod identity;
pub mod log;
pub mod masterkey;
pub mod medium;
pub mod rekey;
pub mod sealer;
pub mod settings;

use std::path::{Path, PathBuf};

pub use blob::BlobStore;
pub use identity::{IdentityDb, LocalIdentity};
pub use log::{decode_entry, encode_entry, MessageLog, LOG_ENTRY_LENGTH};
pub use masterkey::{calibrate_params, MasterKeyDb, MasterKeyRecord};
pub use medium::{temp_path, DiskMedium, Medium};
pub use rekey::change_master_key;
pub use sealer::{AeadSealer, DigestSealer, Sealer};
pub use settings::{SettingValue, Settings, SettingsContext, SettingsDb};

/// Database locations of one endpoint (`operation` is e.g. `tx`).
#[derive(Debug, Clone)]
pub struct Profile {
    data_dir: PathBuf,
    operation: String,
}

impl Profile {
    pub fn new(data_dir: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            operation: operation.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}_{name}", self.operation))
    }

    pub fn login_path(&self) -> PathBuf {
        self.file("login_data")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.file("settings")
    }

    pub fn identity_path(&self) -> PathBuf {
        self.file("identity")
    }

    pub fn log_path(&self) -> PathBuf {
        self.file("log")
    }
}
