//! Storage backend contract and dispatch.
//!
//! A driver implements [`Storage`] and hands out [`RandomReadFile`] and
//! [`WriteFile`] handles. [`StorageBackend`] is the owned entry point
//! applications use: it is built once from a [`StorageConfig`] and forwards
//! every call to exactly one driver.

use crate::config::{StorageConfig, StorageKind};
use crate::error::{StoreError, StoreResult};
use crate::info::FileInfo;
use crate::object::{ObjectConnector, ObjectStorage, Unconnected};
use crate::posix::PosixStorage;
use std::fmt;
use tracing::debug;

/// A read-only, offset-addressable view of one stored object.
///
/// Every read carries its own offset, so a handle can be shared between
/// threads. The size is fixed at a consistent snapshot for the life of the
/// handle.
pub trait RandomReadFile: Send + Sync + fmt::Debug {
    /// The path this handle was opened on.
    fn path(&self) -> &str;

    /// Returns the total length of the object in bytes.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` if the size cannot be determined.
    fn get_size(&self) -> StoreResult<u64>;

    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `EndOfFile` carrying the available bytes when
    /// `offset + len` runs past the end, or `ConnectionFailed` on a transient
    /// I/O failure.
    fn read(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>>;
}

/// An append-only view for producing one stored object.
///
/// Appended bytes become durable only when [`WriteFile::save`] commits them.
/// The lifecycle is `open -> append* -> saved`; a handle never returns to
/// the open state.
///
/// Dropping a handle without saving is a caller error. Drivers in this crate
/// leave the previously stored object untouched in that case.
pub trait WriteFile: Send + fmt::Debug {
    /// The path this handle was opened on.
    fn path(&self) -> &str;

    /// Appends `data` after everything appended so far.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` after `save`, or `OutOfSpace` if the backend
    /// rejects the bytes.
    fn append(&mut self, data: &[u8]) -> StoreResult<()>;

    /// Commits all appended bytes as one object, replacing any prior object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the handle was already saved, or the
    /// backend's error if the commit fails.
    fn save(&mut self) -> StoreResult<()>;

    /// Returns true once `save` has succeeded.
    fn is_saved(&self) -> bool;
}

/// The contract every storage driver satisfies.
///
/// Paths are plain strings interpreted relative to the driver's root. Every
/// operation is independent of the others; the driver owns no handles.
pub trait Storage: Send + Sync + fmt::Debug {
    /// The kind of backend this driver talks to.
    fn kind(&self) -> StorageKind;

    /// Opens `path` for random-access reads.
    ///
    /// # Errors
    ///
    /// `FileDoesNotExist` if absent, `PermissionsError` if unreadable,
    /// `ConnectionFailed` if the backend is unavailable.
    fn make_random_read_file(&self, path: &str) -> StoreResult<Box<dyn RandomReadFile>>;

    /// Opens a write target at `path`.
    ///
    /// # Errors
    ///
    /// `PermissionsError` if the path cannot be created, `OutOfSpace` if the
    /// backend reports no room.
    fn make_write_file(&self, path: &str) -> StoreResult<Box<dyn WriteFile>>;

    /// Describes `path`. A missing path is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend cannot be queried.
    fn get_file_info(&self, path: &str) -> StoreResult<FileInfo>;

    /// Creates a directory. Succeeds if it already exists.
    ///
    /// # Errors
    ///
    /// `FileExists` if a file occupies the path, or the backend's error.
    fn make_dir(&self, path: &str) -> StoreResult<()>;

    /// Deletes a file.
    ///
    /// # Errors
    ///
    /// `FileDoesNotExist` if absent.
    fn delete_file(&self, path: &str) -> StoreResult<()>;

    /// Recursively deletes a directory.
    ///
    /// Deletion is not transactional: on failure, whatever was already
    /// removed stays removed.
    ///
    /// # Errors
    ///
    /// `FileDoesNotExist` if absent, `ConnectionFailed` if the removal could
    /// not be completed.
    fn delete_dir(&self, path: &str) -> StoreResult<()>;
}

/// A storage session bound to one backend kind and one root.
///
/// Safe to share between threads for independent operations. Two write
/// handles on the same path race; whichever save the backend observes last
/// wins.
///
/// # Example
///
/// ```rust
/// use storehouse::{StorageBackend, StorageConfig};
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = StorageConfig::make_posix_config(dir.path());
/// let backend = StorageBackend::make_from_config(&config).unwrap();
///
/// let mut file = backend.make_write_file("data/1").unwrap();
/// file.append(b"hello ").unwrap();
/// file.append(b"world").unwrap();
/// file.save().unwrap();
///
/// let file = backend.make_random_read_file("data/1").unwrap();
/// assert_eq!(file.get_size().unwrap(), 11);
/// assert_eq!(file.read(6, 5).unwrap(), b"world");
/// ```
pub struct StorageBackend {
    inner: Box<dyn Storage>,
}

impl StorageBackend {
    /// Builds a backend from a configuration.
    ///
    /// Object-store kinds need a transport; this entry point has none linked
    /// and fails them with `ConnectionFailed` after validating their fields.
    /// Use [`StorageBackend::make_from_config_with`] to supply one.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed configuration, `PermissionsError` if
    /// the root or credentials are refused, `ConnectionFailed` if the backend
    /// cannot be reached.
    pub fn make_from_config(config: &StorageConfig) -> StoreResult<Self> {
        Self::make_from_config_with(config, &Unconnected)
    }

    /// Builds a backend, using `connector` for object-store kinds.
    ///
    /// # Errors
    ///
    /// See [`StorageBackend::make_from_config`].
    pub fn make_from_config_with(
        config: &StorageConfig,
        connector: &dyn ObjectConnector,
    ) -> StoreResult<Self> {
        debug!(kind = %config.kind(), "constructing storage backend");
        let inner: Box<dyn Storage> = match config.kind() {
            StorageKind::Posix => Box::new(PosixStorage::from_config(config)?),
            StorageKind::Gcs | StorageKind::S3 => {
                Box::new(ObjectStorage::from_config(config, connector)?)
            }
        };
        Ok(Self { inner })
    }

    /// Wraps an already constructed driver.
    pub fn from_storage(storage: impl Storage + 'static) -> Self {
        Self {
            inner: Box::new(storage),
        }
    }

    /// The kind of backend this session talks to.
    #[must_use]
    pub fn kind(&self) -> StorageKind {
        self.inner.kind()
    }

    /// Opens `path` for random-access reads. See [`Storage::make_random_read_file`].
    ///
    /// # Errors
    ///
    /// `FileDoesNotExist`, `PermissionsError` or `ConnectionFailed`.
    pub fn make_random_read_file(&self, path: &str) -> StoreResult<Box<dyn RandomReadFile>> {
        debug!(path, "open for read");
        self.inner.make_random_read_file(path)
    }

    /// Opens a write target at `path`. See [`Storage::make_write_file`].
    ///
    /// # Errors
    ///
    /// `PermissionsError` or `OutOfSpace`.
    pub fn make_write_file(&self, path: &str) -> StoreResult<Box<dyn WriteFile>> {
        debug!(path, "open for write");
        self.inner.make_write_file(path)
    }

    /// Describes `path`. See [`Storage::get_file_info`].
    ///
    /// # Errors
    ///
    /// Only on backend connectivity failures.
    pub fn get_file_info(&self, path: &str) -> StoreResult<FileInfo> {
        self.inner.get_file_info(path)
    }

    /// Creates a directory idempotently. See [`Storage::make_dir`].
    ///
    /// # Errors
    ///
    /// `FileExists` if a file occupies the path.
    pub fn make_dir(&self, path: &str) -> StoreResult<()> {
        debug!(path, "make dir");
        self.inner.make_dir(path)
    }

    /// Deletes a file. See [`Storage::delete_file`].
    ///
    /// # Errors
    ///
    /// `FileDoesNotExist` if absent.
    pub fn delete_file(&self, path: &str) -> StoreResult<()> {
        debug!(path, "delete file");
        self.inner.delete_file(path)
    }

    /// Recursively deletes a directory. See [`Storage::delete_dir`].
    ///
    /// # Errors
    ///
    /// `FileDoesNotExist` if absent, `ConnectionFailed` on an incomplete sweep.
    pub fn delete_dir(&self, path: &str) -> StoreResult<()> {
        debug!(path, "delete dir");
        self.inner.delete_dir(path)
    }

    /// Reads a whole object.
    ///
    /// # Errors
    ///
    /// Any error from opening or reading the object.
    pub fn read_all(&self, path: &str) -> StoreResult<Vec<u8>> {
        let file = self.make_random_read_file(path)?;
        let size = file.get_size()?;
        let len = usize::try_from(size).map_err(|_| {
            StoreError::invalid(format!("{path}: {size} bytes do not fit in memory"))
        })?;
        file.read(0, len)
    }

    /// Writes `data` as the whole content of `path` and commits it.
    ///
    /// # Errors
    ///
    /// Any error from opening, appending or saving.
    pub fn write_all(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let mut file = self.make_write_file(path)?;
        file.append(data)?;
        file.save()
    }
}

impl fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBackend")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Computes the bytes a read of `len` at `offset` may return from an object
/// of `size` bytes, and whether the request runs past the end.
pub(crate) fn clamp_read(offset: u64, len: usize, size: u64) -> (usize, bool) {
    let available = size.saturating_sub(offset);
    let want = len as u64;
    if offset > size {
        (0, true)
    } else if want <= available {
        (len, false)
    } else {
        // available < want <= usize::MAX, so the cast is lossless
        (available as usize, true)
    }
}
