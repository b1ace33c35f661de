//! memlat - per-page latency benchmarks for compressed-swap subsystems.
//!
//! Progress goes to stderr, the result document to stdout.
//!
//! # Usage
//!
//! ```bash
//! # Read (fault + decompress) latency over 512 MB, random access order
//! memlat read 512 1
//!
//! # Write (eviction) latency over 512 MB of zero pages
//! memlat write 512 2
//!
//! # Mixed workload, 70% reads
//! memlat mixed 512 70
//!
//! # Apply memory pressure: 2 GB of mixed data, held for 15 s
//! memlat pressure 2048 0 15
//!
//! # Pin 1 GB of RAM until terminated
//! memlat lock 1024
//! ```

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![warn(clippy::all, clippy::pedantic)]

mod commands;
mod output;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use commands::Completion;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// memlat: per-page latency benchmarks for zram/zswap subsystems
#[derive(Parser)]
#[command(name = "memlat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure page read (fault + decompress) latency
    Read(commands::read::ReadArgs),

    /// Measure page write (eviction) latency
    Write(commands::write::WriteArgs),

    /// Measure latency under a mixed read/write workload
    Mixed(commands::mixed::MixedArgs),

    /// Allocate and fill memory to trigger swapping
    Pressure(commands::pressure::PressureArgs),

    /// Pin RAM with mlock to keep it out of swap during tests
    Lock(commands::lock::LockArgs),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Usage errors exit 1 like every other failure; help and version do not.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code: u8 = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    let result = match cli.command {
        Commands::Read(args) => commands::read::run(args),
        Commands::Write(args) => commands::write::run(args),
        Commands::Mixed(args) => commands::mixed::run(args),
        Commands::Pressure(args) => commands::pressure::run(args),
        Commands::Lock(args) => commands::lock::run(args),
    };

    match result {
        Ok(Completion::Full) => ExitCode::SUCCESS,
        Ok(Completion::Interrupted) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}
