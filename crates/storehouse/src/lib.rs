//! # Storehouse
//!
//! One file API over local disk and object stores.
//!
//! Application code builds a [`StorageConfig`], turns it into a
//! [`StorageBackend`], and from then on never branches on which storage it is
//! talking to. Every operation returns a [`StoreResult`]; the kind of any
//! failure is available as a [`StoreStatus`].
//!
//! ## Design Principles
//!
//! - Backends are byte stores addressed by plain string paths
//! - Reads are random access; writes are append-only and invisible until saved
//! - The core is blocking and performs no retries of its own
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`PosixStorage`] - Local filesystem rooted at a data directory
//! - [`ObjectStorage`] - GCS and S3 buckets, with directories simulated as key prefixes
//! - [`InMemoryObjectClient`] - In-process object store for testing
//!
//! ## Example
//!
//! ```rust
//! use storehouse::{StorageBackend, StorageConfig, StoreStatus};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let backend =
//!     StorageBackend::make_from_config(&StorageConfig::make_posix_config(dir.path())).unwrap();
//!
//! backend.write_all("greeting", b"hello world").unwrap();
//! assert_eq!(backend.read_all("greeting").unwrap(), b"hello world");
//!
//! let missing = backend.make_random_read_file("absent");
//! assert_eq!(StoreStatus::of(&missing), StoreStatus::FileDoesNotExist);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod info;
mod object;
mod posix;
pub mod util;

pub use backend::{RandomReadFile, Storage, StorageBackend, WriteFile};
pub use config::{
    GcsConfig, ObjectStoreOptions, PosixConfig, S3Config, StorageConfig, StorageKind,
    DEFAULT_SPILL_THRESHOLD, DEFAULT_SWEEP_ATTEMPTS,
};
pub use error::{StoreError, StoreResult, StoreStatus};
pub use info::FileInfo;
pub use object::{
    InMemoryObjectClient, MemoryConnector, ObjectClient, ObjectConnector, ObjectOp,
    ObjectStorage, Unconnected,
};
pub use posix::PosixStorage;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
