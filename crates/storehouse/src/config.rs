//! Backend configuration.
//!
//! A [`StorageConfig`] is pure data: building one never touches the disk or
//! the network, and every field is accepted as given. Validation happens when
//! a backend is constructed from it.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default number of list-then-delete passes when removing an object prefix.
pub const DEFAULT_SWEEP_ATTEMPTS: u32 = 3;

/// Default in-memory buffer limit of an object write handle.
pub const DEFAULT_SPILL_THRESHOLD: usize = 8 * 1024 * 1024; // 8 MB

/// The kind of backend a configuration or driver belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Local filesystem.
    Posix,
    /// Google Cloud Storage.
    Gcs,
    /// Amazon S3 or an S3-compatible service.
    S3,
}

impl StorageKind {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::Gcs => "gcs",
            Self::S3 => "s3",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local filesystem configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixConfig {
    /// Root directory all paths are resolved under.
    pub data_directory: PathBuf,
}

/// Google Cloud Storage configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct GcsConfig {
    /// Path to the service account certificates.
    #[zeroize(skip)]
    pub certificates_path: PathBuf,
    /// Key unlocking the certificates.
    pub key: String,
    /// Bucket all paths are resolved under.
    pub bucket: String,
}

impl fmt::Debug for GcsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsConfig")
            .field("certificates_path", &self.certificates_path)
            .field("key", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Amazon S3 configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct S3Config {
    /// Bucket all paths are resolved under.
    pub bucket: String,
    /// Region the bucket lives in.
    pub region: String,
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Endpoint override for S3-compatible services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Configuration a storage backend is constructed from.
///
/// One variant per backend kind. Serialized with a `kind` tag:
///
/// ```json
/// { "kind": "posix", "data_directory": "/var/lib/app" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem.
    Posix(PosixConfig),
    /// Google Cloud Storage.
    Gcs(GcsConfig),
    /// Amazon S3.
    S3(S3Config),
}

impl StorageConfig {
    /// Creates a local filesystem configuration.
    pub fn make_posix_config(data_directory: impl Into<PathBuf>) -> Self {
        Self::Posix(PosixConfig {
            data_directory: data_directory.into(),
        })
    }

    /// Creates a Google Cloud Storage configuration.
    pub fn make_gcs_config(
        certificates_path: impl Into<PathBuf>,
        key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self::Gcs(GcsConfig {
            certificates_path: certificates_path.into(),
            key: key.into(),
            bucket: bucket.into(),
        })
    }

    /// Creates an Amazon S3 configuration.
    pub fn make_s3_config(
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self::S3(S3Config {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            endpoint: None,
        })
    }

    /// Sets the endpoint of an S3 configuration. Other kinds are returned unchanged.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        if let Self::S3(config) = &mut self {
            config.endpoint = Some(endpoint.into());
        }
        self
    }

    /// Returns the backend kind this configuration selects.
    #[must_use]
    pub fn kind(&self) -> StorageKind {
        match self {
            Self::Posix(_) => StorageKind::Posix,
            Self::Gcs(_) => StorageKind::Gcs,
            Self::S3(_) => StorageKind::S3,
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the document is not a valid configuration.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::invalid(format!("malformed storage config: {e}")))
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns the mapped I/O error if the file cannot be read, or
    /// `InvalidArgument` if it is not a valid configuration.
    pub fn from_json_file(path: &Path) -> StoreResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StoreError::from_io(e, path.display().to_string()))?;
        Self::from_json(&json)
    }

    /// Serializes this configuration to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if serialization fails.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::invalid(format!("cannot serialize storage config: {e}")))
    }
}

/// Tuning for the object-store driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectStoreOptions {
    /// Maximum list-then-delete passes when removing a prefix.
    pub sweep_attempts: u32,
    /// Bytes a write handle buffers in memory before spilling to a temp file.
    pub spill_threshold: usize,
}

impl Default for ObjectStoreOptions {
    fn default() -> Self {
        Self {
            sweep_attempts: DEFAULT_SWEEP_ATTEMPTS,
            spill_threshold: DEFAULT_SPILL_THRESHOLD,
        }
    }
}

impl ObjectStoreOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of sweep passes. Values below one are raised to one.
    #[must_use]
    pub const fn sweep_attempts(mut self, attempts: u32) -> Self {
        self.sweep_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    /// Sets the in-memory buffer limit of write handles.
    #[must_use]
    pub const fn spill_threshold(mut self, bytes: usize) -> Self {
        self.spill_threshold = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreStatus;

    #[test]
    fn factories_select_kind() {
        assert_eq!(
            StorageConfig::make_posix_config("/tmp/x").kind(),
            StorageKind::Posix
        );
        assert_eq!(
            StorageConfig::make_gcs_config("/certs.json", "k", "b").kind(),
            StorageKind::Gcs
        );
        assert_eq!(
            StorageConfig::make_s3_config("b", "us-east-1", "id", "secret").kind(),
            StorageKind::S3
        );
    }

    #[test]
    fn posix_json_round_trip() {
        let config = StorageConfig::make_posix_config("/srv/data");
        let json = config.to_json().unwrap();
        assert!(json.contains("\"kind\": \"posix\""));
        assert_eq!(StorageConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn s3_json_without_endpoint() {
        let json = r#"{
            "kind": "s3",
            "bucket": "media",
            "region": "eu-west-1",
            "access_key_id": "AKIA",
            "secret_access_key": "shh"
        }"#;
        let config = StorageConfig::from_json(json).unwrap();
        match &config {
            StorageConfig::S3(s3) => {
                assert_eq!(s3.bucket, "media");
                assert!(s3.endpoint.is_none());
            }
            other => panic!("unexpected config {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_invalid_argument() {
        let err = StorageConfig::from_json(r#"{"kind": "ftp"}"#).unwrap_err();
        assert_eq!(err.status(), StoreStatus::InvalidArgument);
    }

    #[test]
    fn missing_config_file_is_file_does_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = StorageConfig::from_json_file(&dir.path().join("none.json")).unwrap_err();
        assert_eq!(err.status(), StoreStatus::FileDoesNotExist);
    }

    #[test]
    fn debug_redacts_secrets() {
        let gcs = StorageConfig::make_gcs_config("/certs", "private-key", "b");
        let s3 = StorageConfig::make_s3_config("b", "r", "id", "top-secret");
        assert!(!format!("{gcs:?}").contains("private-key"));
        assert!(!format!("{s3:?}").contains("top-secret"));
    }

    #[test]
    fn with_endpoint_only_touches_s3() {
        let s3 =
            StorageConfig::make_s3_config("b", "r", "id", "s").with_endpoint("http://minio:9000");
        match s3 {
            StorageConfig::S3(ref c) => {
                assert_eq!(c.endpoint.as_deref(), Some("http://minio:9000"));
            }
            _ => unreachable!(),
        }
        let posix = StorageConfig::make_posix_config("/d").with_endpoint("ignored");
        assert_eq!(posix, StorageConfig::make_posix_config("/d"));
    }

    #[test]
    fn options_builder() {
        let options = ObjectStoreOptions::new().sweep_attempts(0).spill_threshold(16);
        assert_eq!(options.sweep_attempts, 1);
        assert_eq!(options.spill_threshold, 16);
        assert_eq!(
            ObjectStoreOptions::default().sweep_attempts,
            DEFAULT_SWEEP_ATTEMPTS
        );
    }
}
