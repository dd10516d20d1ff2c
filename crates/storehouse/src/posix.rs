//! Local filesystem driver.
//!
//! Paths map directly onto the tree under the configured `data_directory`.
//! A leading `/` on a caller path is dropped so every path stays under the
//! root; nothing else is normalized.
//!
//! Writes go to a temp file next to the target and are renamed over it on
//! `save`, so readers never observe a partially written object.

use crate::backend::{clamp_read, RandomReadFile, Storage, WriteFile};
use crate::config::{StorageConfig, StorageKind};
use crate::error::{StoreError, StoreResult};
use crate::info::FileInfo;
use crate::util::{mkdir_p, temp_file_in};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Storage rooted at a local directory.
#[derive(Debug)]
pub struct PosixStorage {
    root: PathBuf,
}

impl PosixStorage {
    /// Builds the driver from a configuration.
    ///
    /// # Errors
    ///
    /// `DomainMismatch` for a non-Posix configuration, otherwise see
    /// [`PosixStorage::open`].
    pub fn from_config(config: &StorageConfig) -> StoreResult<Self> {
        match config {
            StorageConfig::Posix(posix) => Self::open(&posix.data_directory),
            other => Err(StoreError::DomainMismatch {
                expected: StorageKind::Posix.as_str(),
                found: other.kind(),
            }),
        }
    }

    /// Opens storage rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `root` is empty or is not a directory,
    /// `PermissionsError` if it cannot be created.
    pub fn open(root: &Path) -> StoreResult<Self> {
        if root.as_os_str().is_empty() {
            return Err(StoreError::invalid("data directory is empty"));
        }
        if root.exists() && !root.is_dir() {
            return Err(StoreError::invalid(format!(
                "data directory is not a directory: {}",
                root.display()
            )));
        }

        let created = mkdir_p(root)?;
        debug!(root = %root.display(), created = created.len(), "opened posix storage");

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// Rejects creating `full` when one of its ancestors below the root is a
    /// regular file.
    fn check_no_file_above(&self, path: &str, full: &Path) -> StoreResult<()> {
        let blocked = full
            .ancestors()
            .skip(1)
            .take_while(|ancestor| *ancestor != self.root && ancestor.starts_with(&self.root))
            .any(Path::is_file);
        if blocked {
            return Err(StoreError::invalid(format!(
                "{path}: a parent component is a file"
            )));
        }
        Ok(())
    }
}

impl Storage for PosixStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Posix
    }

    fn make_random_read_file(&self, path: &str) -> StoreResult<Box<dyn RandomReadFile>> {
        let full = self.resolve(path);
        let file = File::open(&full).map_err(|e| StoreError::from_io(e, path))?;
        let metadata = file.metadata().map_err(|e| StoreError::from_io(e, path))?;
        if metadata.is_dir() {
            return Err(StoreError::invalid(format!("{path} is a directory")));
        }

        Ok(Box::new(PosixReadFile {
            path: path.to_string(),
            file: Mutex::new(file),
            size: metadata.len(),
        }))
    }

    fn make_write_file(&self, path: &str) -> StoreResult<Box<dyn WriteFile>> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() || trimmed.ends_with('/') {
            return Err(StoreError::invalid(format!("{path:?} does not name a file")));
        }

        let target = self.resolve(path);
        if target.is_dir() {
            return Err(StoreError::invalid(format!("{path} is a directory")));
        }
        self.check_no_file_above(path, &target)?;
        let parent = target.parent().unwrap_or(&self.root);
        mkdir_p(parent)?;

        let (file, temp_path) = temp_file_in(parent).map_err(|e| StoreError::from_io(e, path))?;
        Ok(Box::new(PosixWriteFile {
            path: path.to_string(),
            target,
            state: WriteState::Open {
                writer: BufWriter::new(file),
                temp_path,
            },
        }))
    }

    fn get_file_info(&self, path: &str) -> StoreResult<FileInfo> {
        match fs::metadata(self.resolve(path)) {
            Ok(metadata) if metadata.is_dir() => Ok(FileInfo::folder()),
            Ok(metadata) => Ok(FileInfo::file(metadata.len())),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(FileInfo::missing())
            }
            Err(e) => Err(StoreError::from_io(e, path)),
        }
    }

    fn make_dir(&self, path: &str) -> StoreResult<()> {
        let full = self.resolve(path);
        if full.is_file() {
            return Err(StoreError::FileExists {
                path: path.to_string(),
            });
        }
        self.check_no_file_above(path, &full)?;
        mkdir_p(&full)?;
        if !full.is_dir() {
            return Err(StoreError::FileExists {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn delete_file(&self, path: &str) -> StoreResult<()> {
        let full = self.resolve(path);
        let metadata = fs::symlink_metadata(&full).map_err(|e| StoreError::from_io(e, path))?;
        if metadata.is_dir() {
            return Err(StoreError::invalid(format!("{path} is a directory")));
        }
        fs::remove_file(&full).map_err(|e| StoreError::from_io(e, path))
    }

    fn delete_dir(&self, path: &str) -> StoreResult<()> {
        let full = self.resolve(path);
        if full == self.root {
            return Err(StoreError::invalid("cannot delete the storage root"));
        }
        let metadata = fs::symlink_metadata(&full).map_err(|e| StoreError::from_io(e, path))?;
        if !metadata.is_dir() {
            return Err(StoreError::invalid(format!("{path} is not a directory")));
        }
        fs::remove_dir_all(&full).map_err(|e| StoreError::from_io(e, path))
    }
}

/// Read handle over a local file. The size is taken when the file is opened.
#[derive(Debug)]
struct PosixReadFile {
    path: String,
    file: Mutex<File>,
    size: u64,
}

impl RandomReadFile for PosixReadFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn get_size(&self) -> StoreResult<u64> {
        Ok(self.size)
    }

    fn read(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        let (want, mut past_end) = clamp_read(offset, len, self.size);

        let mut buffer = Vec::with_capacity(want);
        if want > 0 {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| StoreError::from_io(e, self.path.as_str()))?;
            // A file truncated behind our back yields fewer bytes.
            (&mut *file)
                .take(want as u64)
                .read_to_end(&mut buffer)
                .map_err(|e| StoreError::from_io(e, self.path.as_str()))?;
            past_end |= buffer.len() < want;
        }

        if past_end {
            return Err(StoreError::EndOfFile {
                offset,
                len,
                size: self.size,
                partial: buffer,
            });
        }
        Ok(buffer)
    }
}

#[derive(Debug)]
enum WriteState {
    Open {
        writer: BufWriter<File>,
        temp_path: PathBuf,
    },
    Saved,
    Failed,
}

/// Write handle staging bytes in a temp file beside the target.
#[derive(Debug)]
struct PosixWriteFile {
    path: String,
    target: PathBuf,
    state: WriteState,
}

impl PosixWriteFile {
    fn commit(&self, writer: BufWriter<File>, temp_path: &Path) -> io::Result<()> {
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        file.sync_all()?;
        drop(file);

        fs::rename(temp_path, &self.target)?;
        sync_parent(&self.target)
    }
}

impl WriteFile for PosixWriteFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn append(&mut self, data: &[u8]) -> StoreResult<()> {
        match &mut self.state {
            WriteState::Open { writer, .. } => writer
                .write_all(data)
                .map_err(|e| StoreError::from_io(e, self.path.as_str())),
            WriteState::Saved => Err(StoreError::invalid(format!(
                "{}: append after save",
                self.path
            ))),
            WriteState::Failed => Err(StoreError::invalid(format!(
                "{}: handle failed during save",
                self.path
            ))),
        }
    }

    fn save(&mut self) -> StoreResult<()> {
        match std::mem::replace(&mut self.state, WriteState::Failed) {
            WriteState::Open { writer, temp_path } => {
                if let Err(e) = self.commit(writer, &temp_path) {
                    let _ = fs::remove_file(&temp_path);
                    return Err(StoreError::from_io(e, self.path.as_str()));
                }
                self.state = WriteState::Saved;
                Ok(())
            }
            WriteState::Saved => {
                self.state = WriteState::Saved;
                Err(StoreError::invalid(format!("{}: already saved", self.path)))
            }
            WriteState::Failed => Err(StoreError::invalid(format!(
                "{}: handle failed during save",
                self.path
            ))),
        }
    }

    fn is_saved(&self) -> bool {
        matches!(self.state, WriteState::Saved)
    }
}

impl Drop for PosixWriteFile {
    fn drop(&mut self) {
        if let WriteState::Open { temp_path, .. } = &self.state {
            warn!(path = %self.path, "write file dropped without save, discarding");
            let _ = fs::remove_file(temp_path);
        }
    }
}

/// Makes a rename inside the target's directory durable.
fn sync_parent(target: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        if let Some(parent) = target.parent() {
            File::open(parent)?.sync_all()?;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = target;
    }
    Ok(())
}
