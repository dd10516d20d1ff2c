//! Throwaway backends for tests.
//!
//! Every fixture owns whatever it needs to stay valid (a temp directory, a
//! certificates file, an in-memory bucket) and cleans up when dropped.

use storehouse::{
    InMemoryObjectClient, MemoryConnector, StorageBackend, StorageConfig, StorageKind,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Bucket name used by object-store fixtures.
pub const TEST_BUCKET: &str = "storehouse-testkit";

/// A test backend with automatic cleanup.
pub struct TestBackend {
    /// The backend under test.
    pub backend: StorageBackend,
    /// The bucket behind an object-store backend, for direct inspection.
    pub objects: Option<Arc<InMemoryObjectClient>>,
    /// Kept alive so the directory outlives the backend.
    temp_dir: TempDir,
}

impl TestBackend {
    /// Creates a Posix backend rooted in a fresh temp directory.
    pub fn posix() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = StorageConfig::make_posix_config(temp_dir.path().join("root"));
        let backend =
            StorageBackend::make_from_config(&config).expect("Failed to open posix backend");

        Self {
            backend,
            objects: None,
            temp_dir,
        }
    }

    /// Creates a GCS backend over an in-memory bucket.
    pub fn gcs() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let certificates = temp_dir.path().join("certificates.json");
        fs::write(&certificates, br#"{"type": "service_account"}"#)
            .expect("Failed to write certificates");

        let config = StorageConfig::make_gcs_config(&certificates, "testkit-key", TEST_BUCKET);
        Self::object(StorageKind::Gcs, &config, temp_dir)
    }

    /// Creates an S3 backend over an in-memory bucket.
    pub fn s3() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = StorageConfig::make_s3_config(TEST_BUCKET, "us-east-1", "AKIDTEST", "secret");
        Self::object(StorageKind::S3, &config, temp_dir)
    }

    /// Creates a backend of the given kind.
    pub fn of_kind(kind: StorageKind) -> Self {
        match kind {
            StorageKind::Posix => Self::posix(),
            StorageKind::Gcs => Self::gcs(),
            StorageKind::S3 => Self::s3(),
        }
    }

    fn object(kind: StorageKind, config: &StorageConfig, temp_dir: TempDir) -> Self {
        let connector = MemoryConnector::new();
        let objects = connector.bucket(kind, TEST_BUCKET);
        let backend = StorageBackend::make_from_config_with(config, &connector)
            .expect("Failed to open object backend");

        Self {
            backend,
            objects: Some(objects),
            temp_dir,
        }
    }

    /// Returns the fixture's scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl std::ops::Deref for TestBackend {
    type Target = StorageBackend;

    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

/// Every backend kind, for tests that must hold across drivers.
pub const ALL_KINDS: [StorageKind; 3] = [StorageKind::Posix, StorageKind::Gcs, StorageKind::S3];

/// Runs a test with a temporary Posix backend.
pub fn with_posix_backend<F, R>(f: F) -> R
where
    F: FnOnce(&StorageBackend) -> R,
{
    let test_backend = TestBackend::posix();
    f(&test_backend.backend)
}

/// Runs a test once against a fresh backend of every kind.
pub fn with_each_backend<F>(mut f: F)
where
    F: FnMut(StorageKind, &StorageBackend),
{
    for kind in ALL_KINDS {
        let test_backend = TestBackend::of_kind(kind);
        f(kind, &test_backend.backend);
    }
}
