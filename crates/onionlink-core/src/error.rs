//! Error classification shared by every onionlink crate.
//!
//! Errors fall in two classes. A fatal error means the cryptographic or
//! persistent state can no longer be trusted and the process must stop; it is
//! only ever acted upon by the binary's top-level handler. A recoverable error
//! rejects one input (a packet, a temp file, a typed-in key) and the caller
//! carries on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FatalKind {
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("invalid length")]
    InvalidLength,
    #[error("crypto failure")]
    CryptoFailure,
    #[error("key collision")]
    KeyCollision,
    #[error("retry limit exhausted")]
    RetryExhausted,
    #[error("corrupt database")]
    CorruptDatabase,
    #[error("I/O")]
    Io,
    #[error("database engine")]
    Database,
    #[error("configuration")]
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecoverableKind {
    #[error("authentication")]
    Authentication,
    #[error("checksum")]
    Checksum,
    #[error("network byte")]
    NetworkByte,
    #[error("padding")]
    Padding,
    #[error("encoding")]
    Encoding,
    #[error("invalid input")]
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("critical {kind} error: {message}")]
    Fatal { kind: FatalKind, message: String },

    #[error("{kind} error: {message}")]
    Recoverable {
        kind: RecoverableKind,
        message: String,
    },
}

impl Error {
    pub fn fatal(kind: FatalKind, message: impl Into<String>) -> Self {
        Error::Fatal {
            kind,
            message: message.into(),
        }
    }

    pub fn recoverable(kind: RecoverableKind, message: impl Into<String>) -> Self {
        Error::Recoverable {
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal { .. })
    }

    pub fn fatal_kind(&self) -> Option<FatalKind> {
        match self {
            Error::Fatal { kind, .. } => Some(*kind),
            Error::Recoverable { .. } => None,
        }
    }

    pub fn recoverable_kind(&self) -> Option<RecoverableKind> {
        match self {
            Error::Recoverable { kind, .. } => Some(*kind),
            Error::Fatal { .. } => None,
        }
    }

    /// Turn a recoverable failure into a fatal one attributed to `source`.
    ///
    /// Used once the caller has no further recovery strategy, e.g. when the
    /// committed content of a database fails to authenticate. Fatal errors
    /// pass through unchanged.
    pub fn escalate(self, source: &str) -> Self {
        match self {
            Error::Recoverable { message, .. } => Error::fatal(
                FatalKind::CorruptDatabase,
                format!("authentication of data in database '{source}' failed: {message}"),
            ),
            fatal => fatal,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::fatal(FatalKind::Io, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_recoverable() {
        let err = Error::recoverable(RecoverableKind::Authentication, "tag mismatch");
        assert!(!err.is_fatal());

        let escalated = err.escalate("user_data/Tx_settings");
        assert_eq!(escalated.fatal_kind(), Some(FatalKind::CorruptDatabase));
        assert!(escalated.to_string().contains("user_data/Tx_settings"));
    }

    #[test]
    fn test_escalate_keeps_fatal_kind() {
        let err = Error::fatal(FatalKind::InvalidLength, "key must be 32 bytes");
        let escalated = err.escalate("db");
        assert_eq!(escalated.fatal_kind(), Some(FatalKind::InvalidLength));
    }

    #[test]
    fn test_io_error_is_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert_eq!(err.fatal_kind(), Some(FatalKind::Io));
    }

    #[test]
    fn test_display_names_kind() {
        let err = Error::recoverable(RecoverableKind::Checksum, "bad checksum");
        assert_eq!(err.to_string(), "checksum error: bad checksum");

        let err = Error::fatal(FatalKind::RetryExhausted, "gave up");
        assert_eq!(err.to_string(), "critical retry limit exhausted error: gave up");
    }
}
