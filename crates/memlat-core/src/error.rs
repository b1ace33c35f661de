//! Error types for memlat-core.

use thiserror::Error;

/// Errors that can occur while setting up or running a workload.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is out of its documented range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The anonymous memory mapping could not be obtained.
    #[error("failed to map {len} bytes of anonymous memory: {source}")]
    Map {
        /// Requested mapping length in bytes.
        len: usize,
        /// OS error from `mmap`.
        source: std::io::Error,
    },

    /// The termination signal handler could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Result type for workload operations.
pub type Result<T> = std::result::Result<T, Error>;
