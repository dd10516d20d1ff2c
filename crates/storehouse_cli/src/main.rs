//! Storehouse CLI
//!
//! Command-line access to any configured Storehouse backend.
//!
//! # Commands
//!
//! - `info` - Show whether a path exists, its kind and size
//! - `cat` - Write an object (or a byte window of it) to stdout
//! - `put` - Store a file, a string, or stdin as an object
//! - `mkdir` - Create a directory and its parents
//! - `rm` - Delete a single object
//! - `rmdir` - Delete a directory and everything under it

mod commands;
mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use std::io;
use std::path::PathBuf;
use storehouse::{StorageBackend, StorageConfig};
use tracing_subscriber::EnvFilter;

/// Storehouse command-line storage tools.
#[derive(Parser)]
#[command(name = "storehouse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON storage configuration
    #[arg(global = true, short, long, conflicts_with = "root")]
    config: Option<PathBuf>,

    /// Use a Posix backend rooted at this directory
    #[arg(global = true, short, long)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a path exists, its kind and size
    Info {
        /// Path relative to the backend root
        path: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write an object to stdout
    Cat {
        /// Path relative to the backend root
        path: String,

        /// First byte to read
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Number of bytes to read (default: to the end)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Store an object from a file, a string, or stdin
    Put {
        /// Path relative to the backend root
        path: String,

        /// Read the contents from this file
        #[arg(short, long, conflicts_with = "data")]
        input: Option<PathBuf>,

        /// Use this string as the contents
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Create a directory and any missing parents
    Mkdir {
        /// Path relative to the backend root
        path: String,
    },

    /// Delete a single object
    Rm {
        /// Path relative to the backend root
        path: String,
    },

    /// Delete a directory and everything under it
    Rmdir {
        /// Path relative to the backend root
        path: String,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Version = cli.command {
        println!("Storehouse CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Storehouse v{}", storehouse::VERSION);
        return Ok(());
    }

    let backend = open_backend(cli.config, cli.root)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Info { path, format } => {
            commands::info::run(&backend, &path, &format, &mut stdout)?;
        }
        Commands::Cat {
            path,
            offset,
            length,
        } => {
            commands::cat::run(&backend, &path, offset, length, &mut stdout)?;
        }
        Commands::Put { path, input, data } => {
            let source = match (input, data) {
                (Some(file), _) => commands::put::Source::File(file),
                (None, Some(data)) => commands::put::Source::Data(data),
                (None, None) => commands::put::Source::Stdin,
            };
            commands::put::run(&backend, &path, source)?;
        }
        Commands::Mkdir { path } => commands::dirs::mkdir(&backend, &path)?,
        Commands::Rm { path } => commands::dirs::rm(&backend, &path)?,
        Commands::Rmdir { path } => commands::dirs::rmdir(&backend, &path)?,
        Commands::Version => {}
    }

    Ok(())
}

fn open_backend(
    config: Option<PathBuf>,
    root: Option<PathBuf>,
) -> Result<StorageBackend, CliError> {
    let config = match (config, root) {
        (Some(path), _) => StorageConfig::from_json_file(&path)?,
        (None, Some(root)) => StorageConfig::make_posix_config(root),
        (None, None) => return Err(CliError::NoBackend),
    };
    Ok(StorageBackend::make_from_config(&config)?)
}
