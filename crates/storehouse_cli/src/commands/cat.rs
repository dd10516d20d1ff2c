//! Cat command implementation.

use crate::error::CliError;
use std::io::Write;
use storehouse::{StorageBackend, StoreError};
use tracing::debug;

/// Largest window fetched per read call.
const CHUNK: u64 = 1 << 20;

/// Writes `length` bytes of `path` starting at `offset` to `out`.
///
/// Without a length the rest of the object is written. A window running past
/// the end writes what is available, then fails with `EndOfFile`.
pub fn run(
    backend: &StorageBackend,
    path: &str,
    offset: u64,
    length: Option<usize>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let file = backend.make_random_read_file(path)?;
    let size = file.get_size()?;
    let end = match length {
        Some(len) => offset.saturating_add(len as u64),
        None => size.max(offset),
    };
    debug!(path, offset, end, size, "cat");

    let mut position = offset;
    loop {
        let want = (end - position).min(CHUNK) as usize;
        match file.read(position, want) {
            Ok(bytes) => out.write_all(&bytes)?,
            Err(StoreError::EndOfFile {
                offset,
                len,
                size,
                partial,
            }) => {
                out.write_all(&partial)?;
                out.flush()?;
                return Err(StoreError::EndOfFile {
                    offset,
                    len,
                    size,
                    partial: Vec::new(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }
        position += want as u64;
        if position >= end {
            break;
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::posix_backend;
    use storehouse::StoreStatus;

    #[test]
    fn whole_object() {
        let (_dir, backend) = posix_backend();
        backend.write_all("data/1", b"hello world").unwrap();

        let mut out = Vec::new();
        run(&backend, "data/1", 0, None, &mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn window() {
        let (_dir, backend) = posix_backend();
        backend.write_all("data/1", b"hello world").unwrap();

        let mut out = Vec::new();
        run(&backend, "data/1", 6, Some(5), &mut out).unwrap();
        assert_eq!(out, b"world");
    }

    #[test]
    fn empty_object() {
        let (_dir, backend) = posix_backend();
        backend.write_all("empty", b"").unwrap();

        let mut out = Vec::new();
        run(&backend, "empty", 0, None, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn past_end_writes_partial_then_fails() {
        let (_dir, backend) = posix_backend();
        backend.write_all("data/1", b"hello world").unwrap();

        let mut out = Vec::new();
        let err = run(&backend, "data/1", 6, Some(10), &mut out).unwrap_err();
        assert_eq!(out, b"world");
        match err {
            CliError::Store(e) => assert_eq!(e.status(), StoreStatus::EndOfFile),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_object() {
        let (_dir, backend) = posix_backend();
        let err = run(&backend, "nope", 0, None, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().starts_with("FileDoesNotExist"));
    }
}
