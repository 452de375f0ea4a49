//! Single-blob databases with write-verify-replace durability
//!
//! Every write goes through the temp file next to the committed one:
//! ```text
//! seal ─▶ write <name>_temp + fsync ─▶ read back + verify ─┬─▶ rename over <name>
//!             ▲                                            │
//!             └──────── retry (bounded) ◀── invalid ───────┘
//! ```
//! A temp file left behind by a crash is promoted on the next load if it
//! verifies and deleted otherwise.

use std::path::{Path, PathBuf};

use onionlink_core::consts::DB_WRITE_RETRY_LIMIT;
use onionlink_core::{Error, FatalKind, Result};

use crate::medium::{temp_path, DiskMedium, Medium};
use crate::sealer::Sealer;

pub struct BlobStore<S, M = DiskMedium> {
    path: PathBuf,
    temp: PathBuf,
    sealer: S,
    medium: M,
    retry_limit: usize,
}

impl<S: Sealer> BlobStore<S, DiskMedium> {
    pub fn new(path: impl Into<PathBuf>, sealer: S) -> Self {
        Self::with_medium(path, sealer, DiskMedium)
    }
}

impl<S: Sealer, M: Medium> BlobStore<S, M> {
    pub fn with_medium(path: impl Into<PathBuf>, sealer: S, medium: M) -> Self {
        let path = path.into();
        Self {
            temp: temp_path(&path),
            path,
            sealer,
            medium,
            retry_limit: DB_WRITE_RETRY_LIMIT,
        }
    }

    /// Total write attempts before giving up (minimum 1).
    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.retry_limit = retry_limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Whether a committed file exists.
    pub fn exists(&self) -> bool {
        self.medium.exists(&self.path)
    }

    /// Seal `plaintext` and commit it.
    pub fn store(&self, plaintext: &[u8]) -> Result<()> {
        self.stage(plaintext)?;
        self.commit()
    }

    /// Seal `plaintext` into a verified temp file without replacing the
    /// committed file.
    pub fn stage(&self, plaintext: &[u8]) -> Result<()> {
        let sealed = self.sealer.seal(plaintext)?;
        self.ensure_temp_write(&sealed)
    }

    /// Promote the staged temp file over the committed file.
    pub fn commit(&self) -> Result<()> {
        self.medium.replace(&self.temp, &self.path)?;
        tracing::info!(database = %self.path.display(), "committed database");
        Ok(())
    }

    /// Open the committed data, completing or discarding an interrupted write
    /// first.
    ///
    /// Committed data that fails verification is fatal.
    pub fn load(&self) -> Result<Vec<u8>> {
        self.recover()?;
        let sealed = self.medium.read(&self.path)?;
        self.sealer
            .open(&sealed)
            .map_err(|e| e.escalate(&self.path.display().to_string()))
    }

    /// Resolve a temp file left by an interrupted write.
    pub fn recover(&self) -> Result<()> {
        if !self.medium.exists(&self.temp) {
            return Ok(());
        }

        if self.verify_file(&self.temp)? {
            tracing::info!(database = %self.path.display(), "promoting verified temp file");
            self.commit()
        } else {
            tracing::warn!(temp = %self.temp.display(), "discarding invalid temp file");
            self.medium.remove(&self.temp)
        }
    }

    /// Read `path` back and check that it opens.
    pub fn verify_file(&self, path: &Path) -> Result<bool> {
        let sealed = self.medium.read(path)?;
        match self.sealer.open(&sealed) {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!(file = %path.display(), "verification failed: {e}");
                Ok(false)
            }
        }
    }

    fn ensure_temp_write(&self, sealed: &[u8]) -> Result<()> {
        for attempt in 1..=self.retry_limit {
            self.medium.write_synced(&self.temp, sealed)?;
            if self.verify_file(&self.temp)? {
                tracing::debug!(temp = %self.temp.display(), attempt, "temp file verified");
                return Ok(());
            }
            tracing::warn!(temp = %self.temp.display(), attempt, "temp file failed verification");
        }

        if let Err(e) = self.medium.remove(&self.temp) {
            tracing::warn!(temp = %self.temp.display(), "failed to remove temp file: {e}");
        }
        Err(Error::fatal(
            FatalKind::RetryExhausted,
            format!(
                "writing to database '{}' failed after {} attempts",
                self.temp.display(),
                self.retry_limit
            ),
        ))
    }
}
