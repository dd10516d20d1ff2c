//! The object-store driver and its file handles.

use super::{ObjectClient, ObjectConnector};
use crate::backend::{clamp_read, RandomReadFile, Storage, WriteFile};
use crate::config::{GcsConfig, ObjectStoreOptions, S3Config, StorageConfig, StorageKind};
use crate::error::{StoreError, StoreResult};
use crate::info::FileInfo;
use crate::util::temp_file;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage over one object-store bucket.
#[derive(Debug)]
pub struct ObjectStorage {
    kind: StorageKind,
    bucket: String,
    client: Arc<dyn ObjectClient>,
    options: ObjectStoreOptions,
}

impl ObjectStorage {
    /// Wraps a connected client.
    pub fn new(
        kind: StorageKind,
        bucket: impl Into<String>,
        client: Arc<dyn ObjectClient>,
    ) -> Self {
        Self {
            kind,
            bucket: bucket.into(),
            client,
            options: ObjectStoreOptions::default(),
        }
    }

    /// Validates an object-store configuration and connects to its bucket.
    ///
    /// # Errors
    ///
    /// `DomainMismatch` for a Posix configuration, `InvalidArgument` for
    /// missing fields or credentials, `PermissionsError` if the credentials
    /// cannot be read, and whatever `connector` reports.
    pub fn from_config(
        config: &StorageConfig,
        connector: &dyn ObjectConnector,
    ) -> StoreResult<Self> {
        match config {
            StorageConfig::Gcs(gcs) => {
                validate_gcs(gcs)?;
                let client = connector.connect_gcs(gcs)?;
                debug!(bucket = %gcs.bucket, "connected to gcs");
                Ok(Self::new(StorageKind::Gcs, gcs.bucket.as_str(), client))
            }
            StorageConfig::S3(s3) => {
                validate_s3(s3)?;
                let client = connector.connect_s3(s3)?;
                debug!(bucket = %s3.bucket, region = %s3.region, "connected to s3");
                Ok(Self::new(StorageKind::S3, s3.bucket.as_str(), client))
            }
            other => Err(StoreError::DomainMismatch {
                expected: "gcs or s3",
                found: other.kind(),
            }),
        }
    }

    /// Replaces the tuning options.
    #[must_use]
    pub fn with_options(mut self, options: ObjectStoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the tuning options.
    #[must_use]
    pub fn options(&self) -> ObjectStoreOptions {
        self.options
    }

    /// Rejects creating `key` when an object already exists at one of its
    /// parent prefixes.
    fn check_no_file_above(&self, path: &str, key: &str) -> StoreResult<()> {
        for (end, _) in key.rmatch_indices('/') {
            if self.client.head(&key[..end])?.is_some() {
                return Err(StoreError::invalid(format!(
                    "{path}: a parent component is a file"
                )));
            }
        }
        Ok(())
    }

    /// Deletes everything under `prefix` in bounded list-then-delete passes.
    fn sweep(&self, path: &str, prefix: &str, mut remaining: Vec<String>) -> StoreResult<()> {
        let attempts = self.options.sweep_attempts.max(1);
        let mut last_failure: Option<StoreError> = None;

        for pass in 1..=attempts {
            for key in &remaining {
                match self.client.delete(key) {
                    // Already gone: someone else won the race.
                    Ok(()) | Err(StoreError::FileDoesNotExist { .. }) => {}
                    Err(e) if e.is_retryable() => {
                        last_failure = Some(e);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }

            match self.client.list(prefix) {
                Ok(keys) => remaining = keys,
                Err(e) if e.is_retryable() => last_failure = Some(e),
                Err(e) => return Err(e),
            }
            if remaining.is_empty() {
                debug!(path, pass, "directory removed");
                return Ok(());
            }
            warn!(path, pass, remaining = remaining.len(), "directory sweep incomplete");
        }

        let cause = last_failure.map(|e| format!(": {e}")).unwrap_or_default();
        Err(StoreError::connection(format!(
            "{path}: {} objects remain after {attempts} sweep passes{cause}",
            remaining.len()
        )))
    }
}

fn validate_bucket(bucket: &str) -> StoreResult<()> {
    if bucket.is_empty() {
        return Err(StoreError::invalid("bucket is empty"));
    }
    if bucket.contains('/') {
        return Err(StoreError::invalid(format!("bucket {bucket:?} contains '/'")));
    }
    Ok(())
}

fn validate_gcs(config: &GcsConfig) -> StoreResult<()> {
    validate_bucket(&config.bucket)?;
    if config.key.is_empty() {
        return Err(StoreError::invalid("gcs key is empty"));
    }

    let certificates = config.certificates_path.display().to_string();
    let contents = fs::read(&config.certificates_path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            StoreError::invalid(format!("certificates not found: {certificates}"))
        }
        _ => StoreError::from_io(e, certificates.as_str()),
    })?;
    if contents.is_empty() {
        return Err(StoreError::invalid(format!(
            "certificates file is empty: {certificates}"
        )));
    }
    Ok(())
}

fn validate_s3(config: &S3Config) -> StoreResult<()> {
    validate_bucket(&config.bucket)?;
    if config.region.is_empty() {
        return Err(StoreError::invalid("s3 region is empty"));
    }
    if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
        return Err(StoreError::invalid("s3 credentials are incomplete"));
    }
    Ok(())
}

/// Key of the object a file path names.
fn object_key(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Prefix shared by everything inside the directory `path`. Empty for the root.
fn dir_prefix(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn file_key<'a>(path: &'a str) -> StoreResult<&'a str> {
    let key = object_key(path);
    if key.is_empty() || key.ends_with('/') {
        return Err(StoreError::invalid(format!("{path:?} does not name a file")));
    }
    Ok(key)
}

impl Storage for ObjectStorage {
    fn kind(&self) -> StorageKind {
        self.kind
    }

    fn make_random_read_file(&self, path: &str) -> StoreResult<Box<dyn RandomReadFile>> {
        let key = file_key(path)?;
        let size = self
            .client
            .head(key)?
            .ok_or_else(|| StoreError::not_found(path))?;

        Ok(Box::new(ObjectReadFile {
            path: path.to_string(),
            key: key.to_string(),
            client: Arc::clone(&self.client),
            size,
        }))
    }

    fn make_write_file(&self, path: &str) -> StoreResult<Box<dyn WriteFile>> {
        let key = file_key(path)?;
        if !self.client.list(&dir_prefix(path))?.is_empty() {
            return Err(StoreError::invalid(format!("{path} is a directory")));
        }
        self.check_no_file_above(path, key)?;

        Ok(Box::new(ObjectWriteFile {
            path: path.to_string(),
            key: key.to_string(),
            client: Arc::clone(&self.client),
            spill_threshold: self.options.spill_threshold,
            spool: Some(Spool::Memory(Vec::new())),
            saved: false,
        }))
    }

    fn get_file_info(&self, path: &str) -> StoreResult<FileInfo> {
        let prefix = dir_prefix(path);
        if prefix.is_empty() {
            return Ok(FileInfo::folder());
        }

        let key = object_key(path);
        if !key.ends_with('/') {
            if let Some(size) = self.client.head(key)? {
                return Ok(FileInfo::file(size));
            }
        }
        if self.client.list(&prefix)?.is_empty() {
            Ok(FileInfo::missing())
        } else {
            Ok(FileInfo::folder())
        }
    }

    fn make_dir(&self, path: &str) -> StoreResult<()> {
        let prefix = dir_prefix(path);
        if prefix.is_empty() {
            return Ok(());
        }
        let key = prefix.trim_end_matches('/');
        if self.client.head(key)?.is_some() {
            return Err(StoreError::FileExists {
                path: path.to_string(),
            });
        }
        self.check_no_file_above(path, key)?;
        self.client.put(&prefix, &[])
    }

    fn delete_file(&self, path: &str) -> StoreResult<()> {
        let key = file_key(path)?;
        match self.client.delete(key) {
            Err(StoreError::FileDoesNotExist { .. }) => {
                if self.client.list(&dir_prefix(path))?.is_empty() {
                    Err(StoreError::not_found(path))
                } else {
                    Err(StoreError::invalid(format!("{path} is a directory")))
                }
            }
            other => other,
        }
    }

    fn delete_dir(&self, path: &str) -> StoreResult<()> {
        let prefix = dir_prefix(path);
        if prefix.is_empty() {
            return Err(StoreError::invalid("cannot delete the bucket root"));
        }

        let keys = self.client.list(&prefix)?;
        if keys.is_empty() {
            if self.client.head(prefix.trim_end_matches('/'))?.is_some() {
                return Err(StoreError::invalid(format!("{path} is not a directory")));
            }
            return Err(StoreError::not_found(path));
        }
        self.sweep(path, &prefix, keys)
    }
}

/// Read handle over one object. The size is taken when the handle is opened.
#[derive(Debug)]
struct ObjectReadFile {
    path: String,
    key: String,
    client: Arc<dyn ObjectClient>,
    size: u64,
}

impl RandomReadFile for ObjectReadFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn get_size(&self) -> StoreResult<u64> {
        Ok(self.size)
    }

    fn read(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        let (want, mut past_end) = clamp_read(offset, len, self.size);

        let mut data = if want > 0 {
            self.client.get_range(&self.key, offset, want)?
        } else {
            Vec::new()
        };
        // The object may have been replaced by a shorter one since open.
        past_end |= data.len() < want;
        data.truncate(want);

        if past_end {
            return Err(StoreError::EndOfFile {
                offset,
                len,
                size: self.size,
                partial: data,
            });
        }
        Ok(data)
    }
}

/// Where a write handle keeps bytes until `save`.
#[derive(Debug)]
enum Spool {
    Memory(Vec<u8>),
    Disk {
        writer: BufWriter<File>,
        temp_path: PathBuf,
    },
}

/// Write handle buffering an object until it is uploaded in one piece.
#[derive(Debug)]
struct ObjectWriteFile {
    path: String,
    key: String,
    client: Arc<dyn ObjectClient>,
    spill_threshold: usize,
    spool: Option<Spool>,
    saved: bool,
}

impl ObjectWriteFile {
    fn io_error(&self, err: io::Error) -> StoreError {
        StoreError::from_io(err, self.path.as_str())
    }

    fn spill(&self, buffer: &[u8], data: &[u8]) -> io::Result<Spool> {
        let (file, temp_path) = temp_file()?;
        let mut writer = BufWriter::new(file);
        let spilled = writer.write_all(buffer).and_then(|()| writer.write_all(data));
        if let Err(e) = spilled {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        debug!(path = %self.path, temp = %temp_path.display(), "write buffer spilled to disk");
        Ok(Spool::Disk { writer, temp_path })
    }

    /// Drains the spool into memory, removing any spill file.
    fn collect(&self, spool: Spool) -> io::Result<Vec<u8>> {
        match spool {
            Spool::Memory(buffer) => Ok(buffer),
            Spool::Disk { writer, temp_path } => {
                let result = (|| -> io::Result<Vec<u8>> {
                    let mut file = writer.into_inner().map_err(|e| e.into_error())?;
                    file.seek(SeekFrom::Start(0))?;
                    let mut data = Vec::new();
                    file.read_to_end(&mut data)?;
                    Ok(data)
                })();
                let _ = fs::remove_file(&temp_path);
                result
            }
        }
    }
}

impl WriteFile for ObjectWriteFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn append(&mut self, data: &[u8]) -> StoreResult<()> {
        if self.saved {
            return Err(StoreError::invalid(format!("{}: append after save", self.path)));
        }
        let spool = self
            .spool
            .take()
            .ok_or_else(|| StoreError::invalid(format!("{}: handle failed", self.path)))?;

        let next = match spool {
            Spool::Memory(mut buffer) => {
                if buffer.len().saturating_add(data.len()) > self.spill_threshold {
                    match self.spill(&buffer, data) {
                        Ok(spilled) => spilled,
                        Err(e) => {
                            self.spool = Some(Spool::Memory(buffer));
                            return Err(self.io_error(e));
                        }
                    }
                } else {
                    buffer.extend_from_slice(data);
                    Spool::Memory(buffer)
                }
            }
            Spool::Disk {
                mut writer,
                temp_path,
            } => {
                // Partially written bytes cannot be taken back.
                if let Err(e) = writer.write_all(data) {
                    let _ = fs::remove_file(&temp_path);
                    return Err(self.io_error(e));
                }
                Spool::Disk { writer, temp_path }
            }
        };
        self.spool = Some(next);
        Ok(())
    }

    fn save(&mut self) -> StoreResult<()> {
        if self.saved {
            return Err(StoreError::invalid(format!("{}: already saved", self.path)));
        }
        let spool = self
            .spool
            .take()
            .ok_or_else(|| StoreError::invalid(format!("{}: handle failed", self.path)))?;

        let data = self.collect(spool).map_err(|e| self.io_error(e))?;
        match self.client.put(&self.key, &data) {
            Ok(()) => {
                self.saved = true;
                debug!(path = %self.path, bytes = data.len(), "object saved");
                Ok(())
            }
            Err(e) => {
                // Keep the bytes so the caller may retry the commit.
                self.spool = Some(Spool::Memory(data));
                Err(e)
            }
        }
    }

    fn is_saved(&self) -> bool {
        self.saved
    }
}

impl Drop for ObjectWriteFile {
    fn drop(&mut self) {
        if self.saved {
            return;
        }
        warn!(path = %self.path, "write file dropped without save, discarding");
        if let Some(Spool::Disk { temp_path, .. }) = &self.spool {
            let _ = fs::remove_file(temp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreStatus;
    use crate::object::{InMemoryObjectClient, MemoryConnector, ObjectOp};
    use parking_lot::Mutex;

    fn storage() -> (Arc<InMemoryObjectClient>, ObjectStorage) {
        let client = Arc::new(InMemoryObjectClient::new());
        let storage = ObjectStorage::new(StorageKind::S3, "bucket", client.clone());
        (client, storage)
    }

    fn write(storage: &ObjectStorage, path: &str, chunks: &[&[u8]]) {
        let mut file = storage.make_write_file(path).unwrap();
        for chunk in chunks {
            file.append(chunk).unwrap();
        }
        file.save().unwrap();
    }

    #[test]
    fn write_then_read() {
        let (client, storage) = storage();
        write(&storage, "data/1", &[b"hello ", b"world"]);
        assert_eq!(client.get("data/1").unwrap(), b"hello world");

        let file = storage.make_random_read_file("data/1").unwrap();
        assert_eq!(file.get_size().unwrap(), 11);
        assert_eq!(file.read(0, 11).unwrap(), b"hello world");
        assert_eq!(file.read(6, 5).unwrap(), b"world");
    }

    #[test]
    fn read_past_end_returns_partial() {
        let (_client, storage) = storage();
        write(&storage, "f", &[b"hello world"]);
        let file = storage.make_random_read_file("f").unwrap();

        match file.read(6, 10).unwrap_err() {
            StoreError::EndOfFile { partial, .. } => assert_eq!(partial, b"world"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn read_after_replacement_with_shorter_object() {
        let (client, storage) = storage();
        write(&storage, "f", &[b"hello world"]);
        let file = storage.make_random_read_file("f").unwrap();

        client.put("f", b"hi").unwrap();
        let err = file.read(0, 11).unwrap_err();
        assert!(matches!(err, StoreError::EndOfFile { ref partial, .. } if partial == b"hi"));
    }

    #[test]
    fn open_missing_is_file_does_not_exist() {
        let (_client, storage) = storage();
        let err = storage.make_random_read_file("never").unwrap_err();
        assert_eq!(err.status(), StoreStatus::FileDoesNotExist);
    }

    #[test]
    fn leading_slash_is_dropped() {
        let (client, storage) = storage();
        write(&storage, "/a/b", &[b"x"]);
        assert!(client.get("a/b").is_some());
        assert!(storage.get_file_info("a/b").unwrap().file_exists);
    }

    #[test]
    fn unsaved_write_uploads_nothing() {
        let (client, storage) = storage();
        {
            let mut file = storage.make_write_file("f").unwrap();
            file.append(b"lost").unwrap();
        }
        assert!(client.is_empty());
    }

    #[test]
    fn append_after_save_is_rejected() {
        let (_client, storage) = storage();
        let mut file = storage.make_write_file("f").unwrap();
        file.save().unwrap();
        assert!(file.is_saved());
        assert_eq!(
            file.append(b"late").unwrap_err().status(),
            StoreStatus::InvalidArgument
        );
        assert_eq!(file.save().unwrap_err().status(), StoreStatus::InvalidArgument);
    }

    #[test]
    fn failed_save_can_be_retried() {
        let (client, storage) = storage();
        let mut file = storage.make_write_file("f").unwrap();
        file.append(b"payload").unwrap();

        client.fail_next(ObjectOp::Put, 1, StoreStatus::ConnectionFailed);
        assert_eq!(file.save().unwrap_err().status(), StoreStatus::ConnectionFailed);
        assert!(!file.is_saved());

        file.save().unwrap();
        assert_eq!(client.get("f").unwrap(), b"payload");
    }

    #[test]
    fn out_of_space_surfaces_from_put() {
        let (client, storage) = storage();
        let mut file = storage.make_write_file("f").unwrap();
        file.append(b"big").unwrap();
        client.fail_next(ObjectOp::Put, 1, StoreStatus::OutOfSpace);
        assert_eq!(file.save().unwrap_err().status(), StoreStatus::OutOfSpace);
    }

    #[test]
    fn large_writes_spill_to_disk() {
        let client = Arc::new(InMemoryObjectClient::new());
        let storage = ObjectStorage::new(StorageKind::Gcs, "b", client.clone())
            .with_options(ObjectStoreOptions::new().spill_threshold(8));
        assert_eq!(storage.options().spill_threshold, 8);

        let mut file = storage.make_write_file("big").unwrap();
        file.append(b"0123").unwrap();
        file.append(b"456789").unwrap();
        file.append(b"abc").unwrap();
        file.save().unwrap();

        assert_eq!(client.get("big").unwrap(), b"0123456789abc");
    }

    #[test]
    fn file_info_for_files_folders_and_missing() {
        let (_client, storage) = storage();
        write(&storage, "dir/file", &[b"12345"]);
        storage.make_dir("empty").unwrap();

        assert_eq!(storage.get_file_info("dir/file").unwrap(), FileInfo::file(5));
        assert_eq!(storage.get_file_info("dir").unwrap(), FileInfo::folder());
        assert_eq!(storage.get_file_info("dir/").unwrap(), FileInfo::folder());
        assert_eq!(storage.get_file_info("empty").unwrap(), FileInfo::folder());
        assert_eq!(storage.get_file_info("").unwrap(), FileInfo::folder());
        assert_eq!(storage.get_file_info("nope").unwrap(), FileInfo::missing());
        // A sibling that only shares a name prefix is not a child.
        assert_eq!(storage.get_file_info("di").unwrap(), FileInfo::missing());
    }

    #[test]
    fn file_info_surfaces_connection_failures() {
        let (client, storage) = storage();
        client.fail_next(ObjectOp::Head, 1, StoreStatus::ConnectionFailed);
        assert_eq!(
            storage.get_file_info("x").unwrap_err().status(),
            StoreStatus::ConnectionFailed
        );
    }

    #[test]
    fn make_dir_writes_marker_once() {
        let (client, storage) = storage();
        storage.make_dir("a/b").unwrap();
        storage.make_dir("a/b").unwrap();
        assert_eq!(client.keys(), vec!["a/b/"]);
    }

    #[test]
    fn make_dir_over_file_is_file_exists() {
        let (_client, storage) = storage();
        write(&storage, "f", &[b"x"]);
        assert_eq!(storage.make_dir("f").unwrap_err().status(), StoreStatus::FileExists);
    }

    #[test]
    fn write_file_over_directory_is_invalid() {
        let (_client, storage) = storage();
        storage.make_dir("d").unwrap();
        assert_eq!(
            storage.make_write_file("d").unwrap_err().status(),
            StoreStatus::InvalidArgument
        );
    }

    #[test]
    fn delete_file_lifecycle() {
        let (_client, storage) = storage();
        let err = storage.delete_file("/f").unwrap_err();
        assert!(matches!(err, StoreError::FileDoesNotExist { ref path } if path == "/f"));

        write(&storage, "f", &[b"x"]);
        storage.delete_file("f").unwrap();
        assert!(!storage.get_file_info("f").unwrap().file_exists);
    }

    #[test]
    fn delete_mismatched_kinds_is_invalid() {
        let (_client, storage) = storage();
        storage.make_dir("d").unwrap();
        write(&storage, "f", &[b"x"]);

        assert_eq!(
            storage.delete_file("d").unwrap_err().status(),
            StoreStatus::InvalidArgument
        );
        assert_eq!(
            storage.delete_dir("f").unwrap_err().status(),
            StoreStatus::InvalidArgument
        );
        assert!(storage.get_file_info("d").unwrap().file_is_folder);
    }

    #[test]
    fn create_below_file_is_invalid() {
        let (client, storage) = storage();
        write(&storage, "f", &[b"x"]);

        assert_eq!(
            storage.make_write_file("f/x").unwrap_err().status(),
            StoreStatus::InvalidArgument
        );
        assert_eq!(
            storage.make_dir("f/sub/deeper").unwrap_err().status(),
            StoreStatus::InvalidArgument
        );
        assert_eq!(client.keys(), vec!["f"]);
    }

    #[test]
    fn delete_dir_removes_prefix_only() {
        let (client, storage) = storage();
        write(&storage, "d/1", &[b"1"]);
        write(&storage, "d/sub/2", &[b"2"]);
        write(&storage, "dd", &[b"sibling"]);
        storage.make_dir("d/empty").unwrap();

        storage.delete_dir("d").unwrap();
        assert_eq!(client.keys(), vec!["dd"]);
        assert_eq!(
            storage.delete_dir("d").unwrap_err().status(),
            StoreStatus::FileDoesNotExist
        );
        assert_eq!(
            storage.delete_dir("/").unwrap_err().status(),
            StoreStatus::InvalidArgument
        );
    }

    #[test]
    fn delete_dir_retries_transient_failures() {
        let (client, storage) = storage();
        for i in 0..5 {
            write(&storage, &format!("d/{i}"), &[b"x"]);
        }

        client.fail_next(ObjectOp::Delete, 1, StoreStatus::ConnectionFailed);
        storage.delete_dir("d").unwrap();
        assert!(client.is_empty());
    }

    #[test]
    fn delete_dir_gives_up_after_bounded_passes() {
        let client = Arc::new(InMemoryObjectClient::new());
        let storage = ObjectStorage::new(StorageKind::S3, "b", client.clone())
            .with_options(ObjectStoreOptions::new().sweep_attempts(2));
        write(&storage, "d/1", &[b"1"]);
        write(&storage, "d/2", &[b"2"]);

        client.fail_next(ObjectOp::Delete, 10, StoreStatus::ConnectionFailed);
        let err = storage.delete_dir("d").unwrap_err();
        assert_eq!(err.status(), StoreStatus::ConnectionFailed);
        assert!(err.to_string().contains("2 sweep passes"));
    }

    #[test]
    fn delete_dir_stops_on_permission_error() {
        let (client, storage) = storage();
        write(&storage, "d/1", &[b"1"]);
        client.fail_next(ObjectOp::Delete, 1, StoreStatus::PermissionsError);
        assert_eq!(
            storage.delete_dir("d").unwrap_err().status(),
            StoreStatus::PermissionsError
        );
    }

    /// A client whose concurrent writer adds one more object under `d/`
    /// after each of the first `rounds` listings.
    #[derive(Debug)]
    struct RacingWriter {
        inner: InMemoryObjectClient,
        rounds: Mutex<u32>,
    }

    impl ObjectClient for RacingWriter {
        fn head(&self, key: &str) -> StoreResult<Option<u64>> {
            self.inner.head(key)
        }
        fn get_range(&self, key: &str, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
            self.inner.get_range(key, offset, len)
        }
        fn put(&self, key: &str, data: &[u8]) -> StoreResult<()> {
            self.inner.put(key, data)
        }
        fn delete(&self, key: &str) -> StoreResult<()> {
            self.inner.delete(key)
        }
        fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
            let listed = self.inner.list(prefix)?;
            let mut rounds = self.rounds.lock();
            if *rounds > 0 {
                *rounds -= 1;
                self.inner.put(&format!("d/late-{rounds}"), b"x")?;
            }
            Ok(listed)
        }
    }

    #[test]
    fn delete_dir_eventually_empties_despite_concurrent_writer() {
        let client = Arc::new(RacingWriter {
            inner: InMemoryObjectClient::new(),
            rounds: Mutex::new(0),
        });
        let storage = ObjectStorage::new(StorageKind::Gcs, "b", client.clone())
            .with_options(ObjectStoreOptions::new().sweep_attempts(4));
        write(&storage, "d/1", &[b"1"]);

        *client.rounds.lock() = 2;
        storage.delete_dir("d").unwrap();
        assert!(client.inner.list("d/").unwrap().is_empty());
    }

    #[test]
    fn from_config_validates_before_connecting() {
        let connector = MemoryConnector::new();

        let missing_secret = StorageConfig::make_s3_config("b", "r", "id", "");
        assert_eq!(
            ObjectStorage::from_config(&missing_secret, &connector)
                .unwrap_err()
                .status(),
            StoreStatus::InvalidArgument
        );

        let bad_bucket = StorageConfig::make_s3_config("a/b", "r", "id", "s");
        assert_eq!(
            ObjectStorage::from_config(&bad_bucket, &connector)
                .unwrap_err()
                .status(),
            StoreStatus::InvalidArgument
        );

        let no_certs = StorageConfig::make_gcs_config("/definitely/not/here.json", "k", "b");
        assert_eq!(
            ObjectStorage::from_config(&no_certs, &connector)
                .unwrap_err()
                .status(),
            StoreStatus::InvalidArgument
        );
    }

    #[test]
    fn from_config_connects_gcs() {
        let dir = tempfile::tempdir().unwrap();
        let certs = dir.path().join("certs.json");
        fs::write(&certs, br#"{"type": "service_account"}"#).unwrap();

        let connector = MemoryConnector::new();
        let config = StorageConfig::make_gcs_config(&certs, "key", "media");
        let storage = ObjectStorage::from_config(&config, &connector).unwrap();
        assert_eq!(storage.kind(), StorageKind::Gcs);
        assert_eq!(storage.bucket(), "media");
    }

    #[test]
    fn from_config_rejects_posix() {
        let config = StorageConfig::make_posix_config("/tmp");
        let err = ObjectStorage::from_config(&config, &MemoryConnector::new()).unwrap_err();
        assert_eq!(err.status(), StoreStatus::DomainMismatch);
    }
}
