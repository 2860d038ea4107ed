//! The error taxonomy shared by every filesystem layer.
//!
//! The taxonomy is flat. Each call site picks the most specific kind and
//! attaches the offending path. Backend-native errors (OS errors, transport
//! errors) are translated at the backend boundary and never escape the
//! public surface.

use std::io;

use thiserror::Error;

/// Result type alias for filesystem operations.
pub type Result<T, E = FsError> = std::result::Result<T, E>;

/// A filesystem failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// No entry exists at the path.
    #[error("no such file or directory: '{0}'")]
    NotFound(String),

    /// The caller may not access the path.
    #[error("permission denied: '{0}'")]
    PermissionDenied(String),

    /// An entry already exists at the path.
    #[error("file exists: '{0}'")]
    AlreadyExists(String),

    /// The entry is a directory where something else was required.
    #[error("is a directory: '{0}'")]
    IsADirectory(String),

    /// The entry is not a directory where one was required.
    #[error("not a directory: '{0}'")]
    NotADirectory(String),

    /// The entry exists but is not a file where one was required.
    #[error("not a file: '{0}'")]
    WrongType(String),

    /// The backend does not implement the operation.
    #[error("operation '{operation}' not supported: '{path}'")]
    Unsupported {
        /// The path the operation was attempted on.
        path: String,
        /// The operation name.
        operation: &'static str,
    },

    /// The operation would block.
    #[error("operation would block")]
    WouldBlock,

    /// The connection was aborted.
    #[error("connection aborted")]
    ConnectionAborted,

    /// The remote end refused the connection.
    #[error("connection refused: '{0}'")]
    ConnectionRefused(String),

    /// The connection was reset by the peer.
    #[error("connection reset by peer")]
    ConnectionReset,

    /// The call was interrupted.
    #[error("interrupted function call")]
    Interrupted,

    /// The other end of a pipe went away.
    #[error("broken pipe")]
    BrokenPipe,

    /// The operation timed out.
    #[error("operation timed out")]
    TimedOut,

    /// A generic backend or transport failure, reported once retries are exhausted.
    #[error("input/output error: '{0}'")]
    IoFailure(String),

    /// A child name that is not exactly one path segment.
    #[error("invalid entry name: '{0}'")]
    InvalidName(String),

    /// Content could not be decoded as text.
    #[error("content is not valid UTF-8: '{0}'")]
    InvalidData(String),
}

impl FsError {
    /// `NotFound` for `path`.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// `PermissionDenied` for `path`.
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied(path.into())
    }

    /// `AlreadyExists` for `path`.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// `IsADirectory` for `path`.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// `NotADirectory` for `path`.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// `WrongType` for `path`.
    pub fn wrong_type(path: impl Into<String>) -> Self {
        Self::WrongType(path.into())
    }

    /// `Unsupported` for `operation` on `path`.
    pub fn unsupported(path: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            path: path.into(),
            operation,
        }
    }

    /// `ConnectionRefused` for `address`.
    pub fn connection_refused(address: impl Into<String>) -> Self {
        Self::ConnectionRefused(address.into())
    }

    /// `IoFailure` for `path`.
    pub fn io_failure(path: impl Into<String>) -> Self {
        Self::IoFailure(path.into())
    }

    /// Translate an OS error raised while operating on `path`.
    #[expect(
        clippy::wildcard_enum_match_arm,
        reason = "ErrorKind is non_exhaustive; IoFailure is the catch-all"
    )]
    pub fn from_io(path: impl Into<String>, err: &io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path),
            io::ErrorKind::IsADirectory => Self::IsADirectory(path),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            io::ErrorKind::WouldBlock => Self::WouldBlock,
            io::ErrorKind::ConnectionAborted => Self::ConnectionAborted,
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused(path),
            io::ErrorKind::ConnectionReset => Self::ConnectionReset,
            io::ErrorKind::Interrupted => Self::Interrupted,
            io::ErrorKind::BrokenPipe => Self::BrokenPipe,
            io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::InvalidData => Self::InvalidData(path),
            _ => Self::IoFailure(path),
        }
    }
}
