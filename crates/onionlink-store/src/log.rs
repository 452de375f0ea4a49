//! Encrypted append-only message log on SQLite
//!
//! Each row holds one XChaCha20-Poly1305 envelope:
//! ```sql
//! CREATE TABLE log_entries (id INTEGER PRIMARY KEY, log_entry BLOB NOT NULL)
//! ```
//! Appends go straight to the committed database. Rewrites (dropping rows or
//! re-keying) go through two siblings of the committed file:
//! ```text
//! build <name>_temp.partial ─▶ rename to <name>_temp ─▶ verify ─▶ rename over <name>
//! ```
//! A rewritten database also carries a `rewrite_marker` row: the expected row
//! count, encrypted under the rewrite's key. A `_temp` only verifies when the
//! marker opens under the caller's key and every promised row is present and
//! authentic, so an unfinished or foreign rewrite is never promoted.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags};

use onionlink_core::consts::{DB_WRITE_RETRY_LIMIT, PADDED_UTF32_STR_LENGTH, TIMESTAMP_LENGTH};
use onionlink_core::{Error, FatalKind, Result};
use onionlink_crypto::{auth_and_decrypt, auth_and_decrypt_database, encrypt_and_sign, SymmetricKey};
use onionlink_encoding::{
    bytes_to_int, bytes_to_str, bytes_to_timestamp, int_to_bytes, str_to_bytes, timestamp_to_bytes,
};

use crate::medium::{temp_path, DiskMedium, Medium};

/// Plaintext of one log entry: `[4 bytes: timestamp][1024 bytes: padded text]`
pub const LOG_ENTRY_LENGTH: usize = TIMESTAMP_LENGTH + PADDED_UTF32_STR_LENGTH;

const SCRATCH_SUFFIX: &str = ".partial";
const JOURNAL_SUFFIX: &str = "-journal";
const MARKER_AD: &[u8] = b"rewrite_marker";

pub fn encode_entry(time: DateTime<Utc>, text: &str) -> Result<Vec<u8>> {
    let mut entry = Vec::with_capacity(LOG_ENTRY_LENGTH);
    entry.extend_from_slice(&timestamp_to_bytes(time)?);
    entry.extend_from_slice(&str_to_bytes(text)?);
    Ok(entry)
}

pub fn decode_entry(entry: &[u8]) -> Result<(DateTime<Utc>, String)> {
    if entry.len() != LOG_ENTRY_LENGTH {
        return Err(Error::fatal(
            FatalKind::InvalidLength,
            format!("log entry must be {LOG_ENTRY_LENGTH} bytes (got {})", entry.len()),
        ));
    }
    let (time, text) = entry.split_at(TIMESTAMP_LENGTH);
    Ok((bytes_to_timestamp(time)?, bytes_to_str(text)?))
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::fatal(FatalKind::Database, e.to_string())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub struct MessageLog<M = DiskMedium> {
    path: PathBuf,
    temp: PathBuf,
    scratch: PathBuf,
    key: SymmetricKey,
    /// `None` after a failed reconnect; `insert` reopens it
    conn: Option<Connection>,
    /// Key of a staged rewrite, adopted on commit
    staged_key: Option<SymmetricKey>,
    medium: M,
    retry_limit: usize,
}

impl MessageLog<DiskMedium> {
    /// Open (or create) the log at `path`, resolving a rewrite left
    /// unfinished by a crash.
    pub fn open(path: impl Into<PathBuf>, key: SymmetricKey) -> Result<Self> {
        Self::open_with_medium(path, key, DiskMedium)
    }
}

impl<M: Medium> MessageLog<M> {
    pub fn open_with_medium(path: impl Into<PathBuf>, key: SymmetricKey, medium: M) -> Result<Self> {
        let path = path.into();
        let temp = temp_path(&path);
        let scratch = with_suffix(&temp, SCRATCH_SUFFIX);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if medium.exists(&scratch) {
            tracing::warn!(scratch = %scratch.display(), "discarding unfinished log rewrite");
        }
        remove_database(&medium, &scratch)?;

        if medium.exists(&temp) {
            if verify_staged(&temp, &key) {
                tracing::info!(database = %path.display(), "promoting verified temp log");
                remove_file(&medium, &with_suffix(&path, JOURNAL_SUFFIX))?;
                medium.replace(&temp, &path)?;
            } else {
                tracing::warn!(temp = %temp.display(), "discarding invalid temp log");
                remove_database(&medium, &temp)?;
            }
        }

        let conn = connect(&path)?;
        Ok(Self {
            path,
            temp,
            scratch,
            key,
            conn: Some(conn),
            staged_key: None,
            medium,
            retry_limit: DB_WRITE_RETRY_LIMIT,
        })
    }

    /// Total attempts for an insert or a rewrite before giving up (minimum 1).
    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.retry_limit = retry_limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| {
            Error::fatal(
                FatalKind::Database,
                format!("log '{}' has no open connection", self.path.display()),
            )
        })
    }

    /// Encrypt and append one entry.
    ///
    /// A failing connection is dropped, reopened and the insert retried.
    pub fn insert(&mut self, plaintext: &[u8]) -> Result<()> {
        let envelope = encrypt_and_sign(plaintext, &self.key, b"")?;

        let mut last_error = String::new();
        for attempt in 1..=self.retry_limit {
            let conn = match self.conn.take() {
                Some(conn) => conn,
                None => match connect(&self.path) {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(database = %self.path.display(), attempt, "reconnect failed: {e}");
                        last_error = e.to_string();
                        continue;
                    }
                },
            };

            match conn.execute(
                "INSERT INTO log_entries (log_entry) VALUES (?1)",
                params![envelope],
            ) {
                Ok(_) => {
                    self.conn = Some(conn);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        database = %self.path.display(),
                        attempt,
                        "log insert failed, reconnecting: {e}"
                    );
                    last_error = e.to_string();
                }
            }
        }

        self.conn = connect(&self.path).ok();
        Err(Error::fatal(
            FatalKind::Database,
            format!(
                "inserting into '{}' failed after {} attempts: {last_error}",
                self.path.display(),
                self.retry_limit
            ),
        ))
    }

    /// Decrypt every entry in insertion order.
    ///
    /// A row that fails to authenticate yields a recoverable error in its
    /// slot; the remaining rows are still returned.
    pub fn entries(&self) -> Result<Vec<Result<Vec<u8>>>> {
        Ok(read_envelopes(self.conn()?)?
            .iter()
            .map(|envelope| auth_and_decrypt(envelope, &self.key, b""))
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))
            .map_err(db_err)?;
        usize::try_from(count)
            .map_err(|_| Error::fatal(FatalKind::Database, format!("invalid row count {count}")))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether every row of the database at `path` decrypts under this log's key.
    pub fn verify_file(&self, path: &Path) -> bool {
        verify_with(path, &self.key)
    }

    /// Rewrite the log keeping only entries for which `keep` returns true,
    /// optionally re-encrypting under `new_key`. Returns the number of
    /// entries kept.
    pub fn rewrite<F>(&mut self, keep: F, new_key: Option<SymmetricKey>) -> Result<usize>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let kept = self.stage_rewrite(keep, new_key)?;
        self.commit_rewrite()?;
        Ok(kept)
    }

    /// Build and verify the rewritten temp database without replacing the
    /// committed one.
    ///
    /// Entries inserted between staging and [`commit_rewrite`](Self::commit_rewrite)
    /// are not part of the staged database.
    pub fn stage_rewrite<F>(&mut self, mut keep: F, new_key: Option<SymmetricKey>) -> Result<usize>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let source = self.path.display().to_string();
        let mut entries = Vec::new();
        for envelope in read_envelopes(self.conn()?)? {
            let plaintext = auth_and_decrypt_database(&envelope, &self.key, &source, b"")?;
            if keep(&plaintext) {
                entries.push(plaintext);
            }
        }

        let target = new_key.as_ref().unwrap_or(&self.key);
        for attempt in 1..=self.retry_limit {
            remove_database(&self.medium, &self.temp)?;
            remove_database(&self.medium, &self.scratch)?;
            write_database(&self.scratch, &entries, target)?;
            self.medium.replace(&self.scratch, &self.temp)?;

            if verify_staged(&self.temp, target) {
                tracing::debug!(temp = %self.temp.display(), attempt, kept = entries.len(), "temp log verified");
                self.staged_key = new_key;
                return Ok(entries.len());
            }
            tracing::warn!(temp = %self.temp.display(), attempt, "temp log failed verification");
        }

        if let Err(e) = remove_database(&self.medium, &self.temp) {
            tracing::warn!(temp = %self.temp.display(), "failed to remove temp log: {e}");
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

    /// Replace the committed database with the staged one and reopen it.
    ///
    /// If the replace fails the committed database is reopened unchanged.
    pub fn commit_rewrite(&mut self) -> Result<()> {
        if !self.medium.exists(&self.temp) {
            return Err(Error::fatal(
                FatalKind::InvalidParameter,
                format!("no staged rewrite for '{}'", self.path.display()),
            ));
        }

        if let Some(conn) = self.conn.take() {
            if let Err((conn, e)) = conn.close() {
                self.conn = Some(conn);
                return Err(db_err(e));
            }
        }

        if let Err(e) = self.medium.replace(&self.temp, &self.path) {
            self.conn = connect(&self.path).ok();
            return Err(e);
        }
        if let Some(key) = self.staged_key.take() {
            self.key = key;
        }
        self.conn = Some(connect(&self.path)?);

        tracing::info!(database = %self.path.display(), "committed rewritten log");
        Ok(())
    }
}

fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(db_err)?;
    conn.execute_batch(
        "PRAGMA synchronous=FULL;
         CREATE TABLE IF NOT EXISTS log_entries (id INTEGER PRIMARY KEY, log_entry BLOB NOT NULL);",
    )
    .map_err(db_err)?;
    Ok(conn)
}

fn remove_file<M: Medium>(medium: &M, path: &Path) -> Result<()> {
    if medium.exists(path) {
        medium.remove(path)?;
    }
    Ok(())
}

/// Remove a database file together with its rollback journal.
fn remove_database<M: Medium>(medium: &M, path: &Path) -> Result<()> {
    remove_file(medium, path)?;
    remove_file(medium, &with_suffix(path, JOURNAL_SUFFIX))
}

fn read_envelopes(conn: &Connection) -> Result<Vec<Vec<u8>>> {
    let mut stmt = conn
        .prepare("SELECT log_entry FROM log_entries ORDER BY id")
        .map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, Vec<u8>>(0))
        .map_err(db_err)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
}

/// Create a complete database at `path` in one transaction.
fn write_database(path: &Path, entries: &[Vec<u8>], key: &SymmetricKey) -> Result<()> {
    let mut conn = Connection::open(path).map_err(db_err)?;
    conn.execute_batch("PRAGMA synchronous=FULL;").map_err(db_err)?;

    let tx = conn.transaction().map_err(db_err)?;
    tx.execute_batch(
        "CREATE TABLE log_entries (id INTEGER PRIMARY KEY, log_entry BLOB NOT NULL);
         CREATE TABLE rewrite_marker (id INTEGER PRIMARY KEY CHECK (id = 0), entry_count BLOB NOT NULL);",
    )
    .map_err(db_err)?;
    for plaintext in entries {
        let envelope = encrypt_and_sign(plaintext, key, b"")?;
        tx.execute(
            "INSERT INTO log_entries (log_entry) VALUES (?1)",
            params![envelope],
        )
        .map_err(db_err)?;
    }
    let marker = encrypt_and_sign(&int_to_bytes(entries.len() as u64), key, MARKER_AD)?;
    tx.execute(
        "INSERT INTO rewrite_marker (id, entry_count) VALUES (0, ?1)",
        params![marker],
    )
    .map_err(db_err)?;
    tx.commit().map_err(db_err)?;

    conn.close().map_err(|(_, e)| db_err(e))
}

fn open_read_only(path: &Path) -> Option<Connection> {
    match Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(conn) => Some(conn),
        Err(e) => {
            tracing::debug!(file = %path.display(), "cannot open log for verification: {e}");
            None
        }
    }
}

fn all_rows_authentic(conn: &Connection, path: &Path, key: &SymmetricKey) -> Option<usize> {
    match read_envelopes(conn) {
        Ok(envelopes) => envelopes
            .iter()
            .all(|envelope| auth_and_decrypt(envelope, key, b"").is_ok())
            .then_some(envelopes.len()),
        Err(e) => {
            tracing::debug!(file = %path.display(), "cannot read log for verification: {e}");
            None
        }
    }
}

fn verify_with(path: &Path, key: &SymmetricKey) -> bool {
    open_read_only(path)
        .and_then(|conn| all_rows_authentic(&conn, path, key))
        .is_some()
}

/// Whether `path` is a complete rewrite made under `key`.
fn verify_staged(path: &Path, key: &SymmetricKey) -> bool {
    let Some(conn) = open_read_only(path) else {
        return false;
    };

    let marker: Vec<u8> = match conn.query_row(
        "SELECT entry_count FROM rewrite_marker WHERE id = 0",
        [],
        |row| row.get(0),
    ) {
        Ok(marker) => marker,
        Err(e) => {
            tracing::debug!(file = %path.display(), "temp log has no rewrite marker: {e}");
            return false;
        }
    };
    let expected = match auth_and_decrypt(&marker, key, MARKER_AD).and_then(|count| bytes_to_int(&count)) {
        Ok(expected) => expected,
        Err(e) => {
            tracing::debug!(file = %path.display(), "rewrite marker does not open: {e}");
            return false;
        }
    };

    all_rows_authentic(&conn, path, key) == Some(expected as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(byte: u8) -> SymmetricKey {
        SymmetricKey::from_bytes([byte; 32])
    }

    fn insert_raw(log: &MessageLog, envelope: &[u8]) {
        log.conn()
            .unwrap()
            .execute("INSERT INTO log_entries (log_entry) VALUES (?1)", params![envelope])
            .unwrap();
    }

    /// Refuses every replace onto the committed database.
    struct NoCommitMedium;

    impl Medium for NoCommitMedium {
        fn write_synced(&self, path: &Path, data: &[u8]) -> Result<()> {
            DiskMedium.write_synced(path, data)
        }

        fn read(&self, path: &Path) -> Result<Vec<u8>> {
            DiskMedium.read(path)
        }

        fn replace(&self, from: &Path, to: &Path) -> Result<()> {
            if to.to_string_lossy().ends_with(onionlink_core::consts::TEMP_SUFFIX) {
                DiskMedium.replace(from, to)
            } else {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only directory").into())
            }
        }

        fn remove(&self, path: &Path) -> Result<()> {
            DiskMedium.remove(path)
        }

        fn exists(&self, path: &Path) -> bool {
            DiskMedium.exists(path)
        }
    }

    #[test]
    fn test_entry_layout() {
        use chrono::TimeZone;
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let entry = encode_entry(time, "hello").unwrap();
        assert_eq!(entry.len(), LOG_ENTRY_LENGTH);
        assert_eq!(decode_entry(&entry).unwrap(), (time, "hello".to_string()));

        let err = decode_entry(&entry[..100]).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidLength));
    }

    #[test]
    fn test_insert_and_read_back() {
        let tmp = TempDir::new().unwrap();
        let mut log = MessageLog::open(tmp.path().join("tx_log"), key(1)).unwrap();
        assert!(log.is_empty().unwrap());

        log.insert(b"first").unwrap();
        log.insert(b"second").unwrap();

        let entries: Vec<Vec<u8>> = log.entries().unwrap().into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(entries, vec![b"first".to_vec(), b"second".to_vec()]);
        assert_eq!(log.len().unwrap(), 2);
    }

    #[test]
    fn test_insert_reconnects_after_broken_connection() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        let mut log = MessageLog::open(&path, key(1)).unwrap();
        log.insert(b"before").unwrap();

        // a connection without the log table fails every insert
        log.conn = Some(Connection::open_in_memory().unwrap());
        log.insert(b"after").unwrap();

        assert_eq!(log.len().unwrap(), 2);
        drop(log);
        let log = MessageLog::open(&path, key(1)).unwrap();
        let entries: Vec<Vec<u8>> = log.entries().unwrap().into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(entries, vec![b"before".to_vec(), b"after".to_vec()]);
    }

    #[test]
    fn test_insert_reopens_missing_connection() {
        let tmp = TempDir::new().unwrap();
        let mut log = MessageLog::open(tmp.path().join("tx_log"), key(1)).unwrap();
        log.conn = None;
        assert!(log.len().is_err());

        log.insert(b"entry").unwrap();
        assert_eq!(log.len().unwrap(), 1);
    }

    #[test]
    fn test_rows_are_encrypted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        let mut log = MessageLog::open(&path, key(1)).unwrap();
        log.insert(b"plaintext marker").unwrap();

        let raw = read_envelopes(log.conn().unwrap()).unwrap();
        assert_eq!(raw.len(), 1);
        assert!(!raw[0].windows(16).any(|w| w == b"plaintext marker"));
    }

    #[test]
    fn test_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        {
            let mut log = MessageLog::open(&path, key(1)).unwrap();
            log.insert(b"kept").unwrap();
        }
        let log = MessageLog::open(&path, key(1)).unwrap();
        assert_eq!(log.len().unwrap(), 1);
        assert!(log.verify_file(&path));
    }

    #[test]
    fn test_foreign_row_reported_per_entry() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        let mut log = MessageLog::open(&path, key(1)).unwrap();
        log.insert(b"good").unwrap();
        insert_raw(&log, &encrypt_and_sign(b"foreign", &key(2), b"").unwrap());
        log.insert(b"also good").unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_ok());
        assert!(!entries[1].as_ref().unwrap_err().is_fatal());
        assert!(entries[2].is_ok());
        assert!(!log.verify_file(&path));
    }

    #[test]
    fn test_rewrite_filters_entries() {
        let tmp = TempDir::new().unwrap();
        let mut log = MessageLog::open(tmp.path().join("tx_log"), key(1)).unwrap();
        for msg in ["alice: hi", "bob: yo", "alice: bye"] {
            log.insert(msg.as_bytes()).unwrap();
        }

        let kept = log.rewrite(|entry| !entry.starts_with(b"bob"), None).unwrap();
        assert_eq!(kept, 2);
        assert_eq!(log.len().unwrap(), 2);
        assert!(!log.temp.exists());
        assert!(!log.scratch.exists());
    }

    #[test]
    fn test_rewrite_with_new_key() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        let mut log = MessageLog::open(&path, key(1)).unwrap();
        log.insert(b"entry").unwrap();

        log.rewrite(|_| true, Some(key(9))).unwrap();
        log.insert(b"after rekey").unwrap();
        drop(log);

        let log = MessageLog::open(&path, key(9)).unwrap();
        let entries: Vec<Vec<u8>> = log.entries().unwrap().into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(entries, vec![b"entry".to_vec(), b"after rekey".to_vec()]);

        let old = MessageLog::open(&path, key(1)).unwrap();
        assert!(!old.verify_file(&path));
    }

    #[test]
    fn test_staged_marker_binds_count_and_key() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        let mut log = MessageLog::open(&path, key(1)).unwrap();
        log.insert(b"a").unwrap();
        log.insert(b"b").unwrap();

        log.stage_rewrite(|_| true, None).unwrap();
        assert!(verify_staged(&log.temp, &key(1)));
        assert!(!verify_staged(&log.temp, &key(2)));

        // a promised row is missing
        let conn = Connection::open(&log.temp).unwrap();
        conn.execute("DELETE FROM log_entries WHERE id = 1", []).unwrap();
        drop(conn);
        assert!(!verify_staged(&log.temp, &key(1)));

        // the committed database has no marker and never verifies as staged
        assert!(!verify_staged(&path, &key(1)));
    }

    #[test]
    fn test_empty_rewrite_under_foreign_key_is_discarded() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        let mut log = MessageLog::open(&path, key(1)).unwrap();
        log.stage_rewrite(|_| true, Some(key(9))).unwrap();
        let temp = log.temp.clone();
        drop(log);

        let log = MessageLog::open(&path, key(1)).unwrap();
        assert!(!temp.exists());
        assert!(log.verify_file(&path));
        assert!(log.is_empty().unwrap());
    }

    #[test]
    fn test_rewrite_of_corrupt_committed_log_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut log = MessageLog::open(tmp.path().join("tx_log"), key(1)).unwrap();
        insert_raw(&log, &encrypt_and_sign(b"foreign", &key(2), b"").unwrap());

        let err = log.rewrite(|_| true, None).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::CorruptDatabase));
    }

    #[test]
    fn test_commit_without_stage_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut log = MessageLog::open(tmp.path().join("tx_log"), key(1)).unwrap();
        let err = log.commit_rewrite().unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::InvalidParameter));
    }

    #[test]
    fn test_failed_commit_keeps_log_on_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tx_log");
        let mut log = MessageLog::open_with_medium(&path, key(1), NoCommitMedium).unwrap();
        log.insert(b"a").unwrap();

        let err = log.rewrite(|_| false, None).unwrap_err();
        assert_eq!(err.fatal_kind(), Some(FatalKind::Io));

        // the log still writes to the committed file, not to memory
        log.insert(b"b").unwrap();
        assert_eq!(log.len().unwrap(), 2);
        let on_disk: i64 = Connection::open(&path)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(on_disk, 2);
    }
}
