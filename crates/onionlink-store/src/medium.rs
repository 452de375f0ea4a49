//! Filesystem operations used by the write-verify-replace protocol
//!
//! The protocol only needs five primitives. Keeping them behind [`Medium`]
//! lets tests inject write corruption and crashes between steps.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use onionlink_core::consts::TEMP_SUFFIX;
use onionlink_core::Result;

pub trait Medium {
    /// Write `data` to `path`, creating parent directories, and force it to
    /// stable storage before returning.
    fn write_synced(&self, path: &Path, data: &[u8]) -> Result<()>;

    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Atomically replace `to` with `from`. Both live in the same directory.
    fn replace(&self, from: &Path, to: &Path) -> Result<()>;

    fn remove(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskMedium;

impl Medium for DiskMedium {
    fn write_synced(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path)?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn replace(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to)?;
        sync_parent_dir(to)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        Ok(fs::remove_file(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Persist the directory entry of `path` after a rename.
#[cfg(unix)]
pub(crate) fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

/// `path` with the temp suffix appended to its file name.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}
