//! Info command implementation.

use crate::error::CliError;
use serde::Serialize;
use std::io::Write;
use storehouse::StorageBackend;

/// What the backend reports about one path.
#[derive(Debug, Serialize)]
pub struct InfoResult {
    /// The queried path.
    pub path: String,
    /// Backend kind name.
    pub backend: &'static str,
    /// Whether anything exists at the path.
    pub exists: bool,
    /// Whether the path is a directory.
    pub is_folder: bool,
    /// Size in bytes; zero for directories and missing paths.
    pub size: u64,
}

/// Runs the info command.
pub fn run(
    backend: &StorageBackend,
    path: &str,
    format: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let info = backend.get_file_info(path)?;
    let result = InfoResult {
        path: path.to_string(),
        backend: backend.kind().as_str(),
        exists: info.file_exists,
        is_folder: info.file_is_folder,
        size: info.size,
    };

    match format {
        "json" => {
            serde_json::to_writer_pretty(&mut *out, &result)?;
            writeln!(out)?;
        }
        "text" => print_text(&result, out)?,
        other => return Err(CliError::Usage(format!("unknown format: {other}"))),
    }
    Ok(())
}

fn print_text(result: &InfoResult, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Path:    {}", result.path)?;
    writeln!(out, "Backend: {}", result.backend)?;
    if !result.exists {
        return writeln!(out, "Status:  missing");
    }
    if result.is_folder {
        writeln!(out, "Status:  directory")
    } else {
        writeln!(out, "Status:  file")?;
        writeln!(out, "Size:    {} bytes", result.size)
    }
}
