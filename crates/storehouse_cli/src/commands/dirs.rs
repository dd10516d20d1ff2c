//! Directory and deletion commands.

use crate::error::CliError;
use storehouse::StorageBackend;
use tracing::info;

/// Creates `path` and any missing parents.
pub fn mkdir(backend: &StorageBackend, path: &str) -> Result<(), CliError> {
    backend.make_dir(path)?;
    info!(path, "directory ready");
    Ok(())
}

/// Deletes the object at `path`.
pub fn rm(backend: &StorageBackend, path: &str) -> Result<(), CliError> {
    backend.delete_file(path)?;
    info!(path, "deleted object");
    Ok(())
}

/// Deletes the directory at `path` with everything beneath it.
pub fn rmdir(backend: &StorageBackend, path: &str) -> Result<(), CliError> {
    backend.delete_dir(path)?;
    info!(path, "deleted directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::posix_backend;
    use storehouse::StoreStatus;

    fn status(err: CliError) -> StoreStatus {
        match err {
            CliError::Store(e) => e.status(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mkdir_then_rmdir() {
        let (_dir, backend) = posix_backend();
        mkdir(&backend, "x/y/z").unwrap();
        backend.write_all("x/y/z/f", b"1").unwrap();
        assert!(backend.get_file_info("x/y").unwrap().file_is_folder);

        rmdir(&backend, "x").unwrap();
        assert!(!backend.get_file_info("x").unwrap().file_exists);
    }

    #[test]
    fn rm_removes_object_only() {
        let (_dir, backend) = posix_backend();
        backend.write_all("d/f", b"1").unwrap();
        rm(&backend, "d/f").unwrap();
        assert!(!backend.get_file_info("d/f").unwrap().file_exists);
        assert!(backend.get_file_info("d").unwrap().file_is_folder);
    }

    #[test]
    fn rm_missing_reports_status() {
        let (_dir, backend) = posix_backend();
        assert_eq!(status(rm(&backend, "gone").unwrap_err()), StoreStatus::FileDoesNotExist);
    }

    #[test]
    fn rmdir_missing_reports_status() {
        let (_dir, backend) = posix_backend();
        assert_eq!(
            status(rmdir(&backend, "gone").unwrap_err()),
            StoreStatus::FileDoesNotExist
        );
    }
}
