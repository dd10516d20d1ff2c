//! CLI error type.

use std::io;
use storehouse::StoreError;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A storage operation failed; the status name leads the message.
    #[error("{}: {0}", .0.status())]
    Store(#[from] StoreError),

    /// Local I/O outside the backend (stdin, stdout, input files).
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Output serialization failed.
    #[error("cannot format output: {0}")]
    Format(#[from] serde_json::Error),

    /// An option value was not understood.
    #[error("invalid option: {0}")]
    Usage(String),

    /// Neither `--config` nor `--root` was given.
    #[error("no backend: pass --config <file> or --root <dir>")]
    NoBackend,
}
