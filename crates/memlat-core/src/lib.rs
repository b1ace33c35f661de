//! Per-page latency sampling for compressed-swap subsystems.
//!
//! This crate isolates the cost of individual memory-subsystem operations
//! (page fault + decompress on read, page eviction on write) instead of
//! measuring aggregate throughput. A [`WorkloadDriver`] owns an anonymous
//! mapping, fills it with a chosen compressibility profile, hints the kernel
//! to evict it, then times one-byte probes against individual pages and
//! aggregates the samples into nearest-rank percentile reports.
//!
//! # Example
//!
//! ```no_run
//! use memlat_core::{CancelToken, WorkloadConfig, WorkloadDriver};
//!
//! let config = WorkloadConfig::new(16).unwrap();
//! let cancel = CancelToken::new();
//! let driver = WorkloadDriver::new(config, cancel).unwrap();
//! let outcome = driver.run_read().unwrap();
//! assert!(!outcome.interrupted);
//! ```

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

mod cancel;
mod error;
pub mod pattern;
mod region;
mod report;
mod rng;
mod sampler;
mod stats;
mod workload;

pub use cancel::{sleep_interruptible, CancelToken};
pub use error::{Error, Result};
pub use pattern::PatternKind;
pub use region::{MemoryRegion, PAGE_SIZE};
pub use report::{RunReport, StatsBlock};
pub use rng::Lcg;
pub use stats::{LatencyReport, SampleSet};
pub use workload::{AccessOrder, RunOutcome, WorkloadConfig, WorkloadDriver, STRIDE_PAGES};
