//! Object-store driver shared by the GCS and S3 backend kinds.
//!
//! Object stores have no directories. A directory is simulated as a key
//! prefix ending in `/`, and `make_dir` writes an empty marker object under
//! that prefix so empty directories are visible.
//!
//! The network transport sits behind [`ObjectClient`] so any HTTP library
//! can be plugged in. An [`ObjectConnector`] turns a validated configuration
//! into a client.

mod memory;
mod storage;

pub use memory::{InMemoryObjectClient, ObjectOp};
pub use storage::ObjectStorage;

use crate::config::{GcsConfig, S3Config, StorageKind};
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Transport to one bucket of an object store.
///
/// Keys are full object names without a leading `/`. Implementations may
/// retry a dropped connection internally, but only for idempotent calls.
pub trait ObjectClient: Send + Sync + fmt::Debug {
    /// Returns the size of `key`, or `None` if no such object exists.
    fn head(&self, key: &str) -> StoreResult<Option<u64>>;

    /// Reads up to `len` bytes of `key` starting at `offset`.
    ///
    /// Fewer bytes come back when the object ends first.
    fn get_range(&self, key: &str, offset: u64, len: usize) -> StoreResult<Vec<u8>>;

    /// Stores `data` as the whole content of `key`, replacing any prior object.
    fn put(&self, key: &str, data: &[u8]) -> StoreResult<()>;

    /// Deletes `key`. Fails with `FileDoesNotExist` if it is absent.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Lists every key that starts with `prefix`, in lexicographic order.
    fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

/// Builds object-store clients from validated configurations.
pub trait ObjectConnector {
    /// Connects to a Google Cloud Storage bucket.
    ///
    /// # Errors
    ///
    /// `PermissionsError` if the credentials are rejected, `ConnectionFailed`
    /// if the service cannot be reached.
    fn connect_gcs(&self, config: &GcsConfig) -> StoreResult<Arc<dyn ObjectClient>>;

    /// Connects to an S3 bucket.
    ///
    /// # Errors
    ///
    /// `PermissionsError` if the credentials are rejected, `ConnectionFailed`
    /// if the service cannot be reached.
    fn connect_s3(&self, config: &S3Config) -> StoreResult<Arc<dyn ObjectClient>>;
}

/// Connector with no network transport linked in. Every connection fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconnected;

impl ObjectConnector for Unconnected {
    fn connect_gcs(&self, config: &GcsConfig) -> StoreResult<Arc<dyn ObjectClient>> {
        Err(StoreError::connection(format!(
            "no gcs transport available for bucket {}",
            config.bucket
        )))
    }

    fn connect_s3(&self, config: &S3Config) -> StoreResult<Arc<dyn ObjectClient>> {
        Err(StoreError::connection(format!(
            "no s3 transport available for bucket {}",
            config.bucket
        )))
    }
}

/// Connector serving buckets from process memory.
///
/// Connecting twice to the same kind and bucket yields the same store, so
/// several backends can observe each other's writes.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    buckets: Mutex<HashMap<(StorageKind, String), Arc<InMemoryObjectClient>>>,
}

impl MemoryConnector {
    /// Creates a connector with no buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store behind `bucket`, creating it if needed.
    pub fn bucket(&self, kind: StorageKind, bucket: &str) -> Arc<InMemoryObjectClient> {
        let mut buckets = self.buckets.lock();
        Arc::clone(
            buckets
                .entry((kind, bucket.to_string()))
                .or_insert_with(|| Arc::new(InMemoryObjectClient::new())),
        )
    }
}

impl ObjectConnector for MemoryConnector {
    fn connect_gcs(&self, config: &GcsConfig) -> StoreResult<Arc<dyn ObjectClient>> {
        let client: Arc<dyn ObjectClient> = self.bucket(StorageKind::Gcs, &config.bucket);
        Ok(client)
    }

    fn connect_s3(&self, config: &S3Config) -> StoreResult<Arc<dyn ObjectClient>> {
        let client: Arc<dyn ObjectClient> = self.bucket(StorageKind::S3, &config.bucket);
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::error::StoreStatus;

    fn s3() -> S3Config {
        match StorageConfig::make_s3_config("media", "us-east-1", "id", "secret") {
            StorageConfig::S3(config) => config,
            _ => unreachable!(),
        }
    }

    #[test]
    fn unconnected_refuses() {
        let err = Unconnected.connect_s3(&s3()).unwrap_err();
        assert_eq!(err.status(), StoreStatus::ConnectionFailed);
        assert!(err.to_string().contains("media"));
    }

    #[test]
    fn memory_connector_shares_buckets() {
        let connector = MemoryConnector::new();
        let first = connector.connect_s3(&s3()).unwrap();
        first.put("k", b"v").unwrap();

        let second = connector.connect_s3(&s3()).unwrap();
        assert_eq!(second.head("k").unwrap(), Some(1));

        // Same bucket name under another kind is a different store.
        assert!(connector
            .bucket(StorageKind::Gcs, "media")
            .head("k")
            .unwrap()
            .is_none());
    }
}
