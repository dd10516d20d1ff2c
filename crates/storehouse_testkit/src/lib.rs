//! # Storehouse Testkit
//!
//! Test utilities for Storehouse.
//!
//! This crate provides:
//! - Fixtures that build throwaway backends of every kind
//! - A conformance suite every driver must pass
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use storehouse_testkit::prelude::*;
//!
//! with_posix_backend(|backend| {
//!     check_round_trip(backend, "docs/a", &[b"one", b"two"]);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod conformance;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::conformance::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use conformance::*;
pub use fixtures::*;
pub use generators::*;
