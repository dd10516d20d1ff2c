//! Property-based test generators using proptest.

use proptest::prelude::*;
use storehouse::StorageKind;

/// Generates a relative path of one to four short segments.
pub fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_]{1,8}", 1..=4).prop_map(|segments| segments.join("/"))
}

/// Generates the chunks handed to successive `append` calls.
///
/// Empty chunks are included on purpose.
pub fn chunks_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..256), 0..8)
}

/// Generates a read window as `(offset, len)` within `0..=max`.
pub fn window_strategy(max: u64) -> impl Strategy<Value = (u64, usize)> {
    (0..=max, 0..=max as usize)
}

/// Cases per property for a backend kind.
///
/// A Posix fixture costs a temp directory and real file I/O per case, so it
/// runs fewer cases than the in-memory object stores.
#[must_use]
pub const fn cases_for(kind: StorageKind) -> u32 {
    match kind {
        StorageKind::Posix => 24,
        StorageKind::Gcs | StorageKind::S3 => 96,
    }
}

/// Proptest settings for a property exercising `kind`.
///
/// Failures are not persisted to a regressions file; the shrunk case is
/// reported in the panic message.
#[must_use]
pub fn driver_config(kind: StorageKind) -> ProptestConfig {
    ProptestConfig {
        cases: cases_for(kind),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}
