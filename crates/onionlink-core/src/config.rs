use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::consts::{DB_WRITE_RETRY_LIMIT, MAX_KEY_DERIVATION_TIME, MIN_KEY_DERIVATION_TIME};
use crate::error::{Error, FatalKind, Result};

/// Top-level configuration (loaded from onionlink.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OnionlinkConfig {
    pub storage: StorageConfig,
    pub kdf: KdfConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding every database file (default: user_data)
    pub data_dir: PathBuf,
    /// Write-verify attempts before a database write is abandoned
    pub write_retry_limit: usize,
}

/// Argon2i parameters for the master key.
///
/// Calibration keeps the memory cost and parallelism and searches the time
/// cost; `time_cost` is only used when calibration is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// Time cost / iterations (default: 1)
    pub time_cost: u32,
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost_kib: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
    /// Lower bound of the derivation time target, seconds
    pub min_derivation_secs: f64,
    /// Upper bound of the derivation time target, seconds
    pub max_derivation_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("user_data"),
            write_retry_limit: DB_WRITE_RETRY_LIMIT,
        }
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            time_cost: 1,
            memory_cost_kib: 65536,
            parallelism: 1,
            min_derivation_secs: MIN_KEY_DERIVATION_TIME,
            max_derivation_secs: MAX_KEY_DERIVATION_TIME,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl OnionlinkConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("config file not found: {} (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::fatal(
                FatalKind::Config,
                format!("parsing config {}: {e}", path.display()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.write_retry_limit == 0 {
            return Err(Error::fatal(
                FatalKind::Config,
                "storage.write_retry_limit must be at least 1",
            ));
        }
        if self.kdf.time_cost == 0 || self.kdf.memory_cost_kib == 0 || self.kdf.parallelism == 0 {
            return Err(Error::fatal(
                FatalKind::Config,
                "kdf costs must be greater than zero",
            ));
        }
        for secs in [self.kdf.min_derivation_secs, self.kdf.max_derivation_secs] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(Error::fatal(
                    FatalKind::Config,
                    format!("kdf derivation time bounds must be non-negative seconds (got {secs})"),
                ));
            }
        }
        if self.kdf.min_derivation_secs > self.kdf.max_derivation_secs {
            return Err(Error::fatal(
                FatalKind::Config,
                "kdf.min_derivation_secs exceeds kdf.max_derivation_secs",
            ));
        }
        if !matches!(self.log.format.as_str(), "text" | "json") {
            return Err(Error::fatal(
                FatalKind::Config,
                format!("log.format must be \"text\" or \"json\" (got {:?})", self.log.format),
            ));
        }
        Ok(())
    }
}
