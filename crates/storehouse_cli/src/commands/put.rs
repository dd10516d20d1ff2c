//! Put command implementation.

use crate::error::CliError;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use storehouse::StorageBackend;
use tracing::info;

const BUFFER_SIZE: usize = 64 * 1024;

/// Where the object's contents come from.
#[derive(Debug)]
pub enum Source {
    /// A local file, streamed in chunks.
    File(PathBuf),
    /// A literal string.
    Data(String),
    /// Standard input, streamed in chunks.
    Stdin,
}

/// Stores the contents of `source` at `path`, replacing any prior object.
pub fn run(backend: &StorageBackend, path: &str, source: Source) -> Result<(), CliError> {
    let written = match source {
        Source::Data(data) => {
            backend.write_all(path, data.as_bytes())?;
            data.len() as u64
        }
        Source::File(file) => copy_in(backend, path, File::open(file)?)?,
        Source::Stdin => copy_in(backend, path, io::stdin().lock())?,
    };

    info!(path, bytes = written, "stored object");
    Ok(())
}

fn copy_in(backend: &StorageBackend, path: &str, mut reader: impl Read) -> Result<u64, CliError> {
    let mut file = backend.make_write_file(path)?;
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        file.append(&buffer[..n])?;
        total += n as u64;
    }

    file.save()?;
    Ok(total)
}
