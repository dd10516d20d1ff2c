//! Outcome taxonomy shared by every storage operation.
//!
//! Every fallible operation returns a [`StoreResult`]. `Ok` is the `Success`
//! outcome; each [`StoreError`] variant is exactly one of the non-success
//! kinds. [`StoreStatus`] names the kind without its context, which is what
//! an embedding layer branches on.

use crate::config::StorageKind;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The kind of outcome of a storage operation.
///
/// `Success` is the only value that permits trusting an operation's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreStatus {
    /// The operation completed.
    Success,
    /// The target already exists.
    FileExists,
    /// The target does not exist.
    FileDoesNotExist,
    /// The stored data is unreadable or inconsistent.
    FileCorrupted,
    /// A read ran past the end of the object.
    EndOfFile,
    /// The backend has no room for the write.
    OutOfSpace,
    /// The configuration or path belongs to a different backend kind.
    DomainMismatch,
    /// The backend refused access.
    PermissionsError,
    /// The backend could not be reached, or a transient I/O failure occurred.
    ConnectionFailed,
    /// The caller supplied an argument the operation cannot accept.
    InvalidArgument,
}

impl StoreStatus {
    /// Returns the status of a result without consuming it.
    pub fn of<T>(result: &StoreResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(err) => err.status(),
        }
    }

    /// Returns the stable name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::FileExists => "FileExists",
            Self::FileDoesNotExist => "FileDoesNotExist",
            Self::FileCorrupted => "FileCorrupted",
            Self::EndOfFile => "EndOfFile",
            Self::OutOfSpace => "OutOfSpace",
            Self::DomainMismatch => "DomainMismatch",
            Self::PermissionsError => "PermissionsError",
            Self::ConnectionFailed => "ConnectionFailed",
            Self::InvalidArgument => "InvalidArgument",
        }
    }

    /// Returns true for `Success`.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Only transient backend failures qualify. Space and permission errors
    /// will not clear up by themselves.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::ConnectionFailed)
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The target already exists.
    #[error("file exists: {path}")]
    FileExists {
        /// The conflicting path.
        path: String,
    },

    /// The target does not exist.
    #[error("file does not exist: {path}")]
    FileDoesNotExist {
        /// The missing path.
        path: String,
    },

    /// The stored data is unreadable or inconsistent.
    #[error("file corrupted: {path}: {reason}")]
    FileCorrupted {
        /// The affected path.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A read ran past the end of the object.
    ///
    /// `partial` holds the bytes that were available between `offset` and
    /// the end of the object.
    #[error("end of file: offset {offset}, len {len}, size {size}")]
    EndOfFile {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The object size seen by the handle.
        size: u64,
        /// Bytes that were available before the end.
        partial: Vec<u8>,
    },

    /// The backend rejected a write for lack of space or quota.
    #[error("out of space: {path}")]
    OutOfSpace {
        /// The path being written.
        path: String,
    },

    /// A configuration of one backend kind was handed to another.
    #[error("domain mismatch: expected {expected} storage, got {found}")]
    DomainMismatch {
        /// The kind or kinds the driver serves.
        expected: &'static str,
        /// The kind that was supplied.
        found: StorageKind,
    },

    /// The backend refused access.
    #[error("permission denied: {path}: {reason}")]
    PermissionsError {
        /// The path or resource that was refused.
        path: String,
        /// Backend-supplied detail.
        reason: String,
    },

    /// The backend could not be reached, or a transient I/O failure occurred.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// What failed.
        reason: String,
    },

    /// The caller supplied an argument the operation cannot accept.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why it was rejected.
        reason: String,
    },
}

impl StoreError {
    /// Returns the kind of this error.
    #[must_use]
    pub fn status(&self) -> StoreStatus {
        match self {
            Self::FileExists { .. } => StoreStatus::FileExists,
            Self::FileDoesNotExist { .. } => StoreStatus::FileDoesNotExist,
            Self::FileCorrupted { .. } => StoreStatus::FileCorrupted,
            Self::EndOfFile { .. } => StoreStatus::EndOfFile,
            Self::OutOfSpace { .. } => StoreStatus::OutOfSpace,
            Self::DomainMismatch { .. } => StoreStatus::DomainMismatch,
            Self::PermissionsError { .. } => StoreStatus::PermissionsError,
            Self::ConnectionFailed { .. } => StoreStatus::ConnectionFailed,
            Self::InvalidArgument { .. } => StoreStatus::InvalidArgument,
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status().is_retryable()
    }

    /// Creates a `FileDoesNotExist` error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::FileDoesNotExist { path: path.into() }
    }

    /// Creates an `InvalidArgument` error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection(reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            reason: reason.into(),
        }
    }

    /// Translates an I/O error raised while operating on `path`.
    pub fn from_io(err: io::Error, path: impl Into<String>) -> Self {
        let path = path.into();
        match err.kind() {
            // A component of the path is a regular file, so nothing below it exists.
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
                Self::FileDoesNotExist { path }
            }
            io::ErrorKind::AlreadyExists => Self::FileExists { path },
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                Self::PermissionsError {
                    path,
                    reason: err.to_string(),
                }
            }
            io::ErrorKind::StorageFull | io::ErrorKind::FileTooLarge => Self::OutOfSpace { path },
            io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::IsADirectory
            | io::ErrorKind::DirectoryNotEmpty => Self::InvalidArgument {
                reason: format!("{path}: {err}"),
            },
            io::ErrorKind::UnexpectedEof => Self::FileCorrupted {
                path,
                reason: err.to_string(),
            },
            _ => Self::ConnectionFailed {
                reason: format!("{path}: {err}"),
            },
        }
    }
}
