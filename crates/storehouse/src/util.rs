//! Filesystem helpers used by disk-backed drivers.

use crate::error::StoreError;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest path, in bytes, [`mkdir_p`] accepts.
pub const PATH_MAX_LEN: usize = 4096;

/// Prefix of every file allocated by [`temp_file`].
const TEMP_PREFIX: &str = "storehouse";

/// Errors raised by the filesystem helpers.
#[derive(Debug, Error)]
pub enum UtilError {
    /// The path is longer than [`PATH_MAX_LEN`].
    #[error("name too long: {len} bytes exceeds {max}")]
    NameTooLong {
        /// Length of the rejected path.
        len: usize,
        /// The limit.
        max: usize,
    },

    /// Creating a component failed for a reason other than "already exists".
    #[error("cannot create {path}: {source}")]
    Io {
        /// The component being created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

impl From<UtilError> for StoreError {
    fn from(err: UtilError) -> Self {
        match err {
            UtilError::NameTooLong { .. } => StoreError::invalid(err.to_string()),
            UtilError::Io { path, source } => {
                StoreError::from_io(source, path.display().to_string())
            }
        }
    }
}

/// Creates `path` and every missing ancestor, from the root down.
///
/// Components that already exist are left alone. The first real failure
/// aborts; nothing deeper is attempted. Returns the directories that were
/// actually created, outermost first.
///
/// # Errors
///
/// Returns [`UtilError::NameTooLong`] without touching the disk if the path is
/// longer than [`PATH_MAX_LEN`], or [`UtilError::Io`] for the component that
/// could not be created.
pub fn mkdir_p(path: &Path) -> Result<Vec<PathBuf>, UtilError> {
    let len = path.as_os_str().len();
    if len > PATH_MAX_LEN {
        return Err(UtilError::NameTooLong {
            len,
            max: PATH_MAX_LEN,
        });
    }

    let mut components: Vec<&Path> = path
        .ancestors()
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    components.reverse();

    let mut created = Vec::new();
    for component in components {
        match fs::create_dir(component) {
            Ok(()) => created.push(component.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            // The filesystem root reports this on some platforms.
            Err(e)
                if component.parent().is_none()
                    && e.kind() == io::ErrorKind::PermissionDenied => {}
            Err(source) => {
                return Err(UtilError::Io {
                    path: component.to_path_buf(),
                    source,
                })
            }
        }
    }

    Ok(created)
}

/// Allocates a uniquely named file in the system temp directory.
///
/// The file is open for reading and writing. It is not removed automatically;
/// the caller owns both the handle and the name.
///
/// # Errors
///
/// Returns an error if no file can be created.
pub fn temp_file() -> io::Result<(File, PathBuf)> {
    temp_file_in(&std::env::temp_dir())
}

/// Allocates a uniquely named file in `dir`.
///
/// The name is claimed with an exclusive create, so concurrent callers never
/// receive the same file.
///
/// # Errors
///
/// Returns an error if no file can be created in `dir`.
pub fn temp_file_in(dir: &Path) -> io::Result<(File, PathBuf)> {
    let file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)?;
    file.keep().map_err(|e| e.error)
}
