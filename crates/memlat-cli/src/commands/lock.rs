//! RAM-pinning command.
//!
//! Locks a region with mlock and stays resident until terminated, so only
//! the memory under test is subject to swapping during a benchmark. Locking
//! 60% of free RAM before a pressure run turns "compress freely available
//! memory" into realistic pressure with actual writeback.

use super::Completion;
use anyhow::Result;
use clap::Args;
use memlat_core::{sleep_interruptible, CancelToken, MemoryRegion, WorkloadConfig};
use std::time::Duration;
use tracing::{info, warn};

const FILL_CHUNK: usize = 64 * 1024 * 1024;

/// Arguments for the locker.
#[derive(Args)]
pub struct LockArgs {
    /// Amount of RAM to pin, in MB.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub size_mb: u64,
}

pub fn run(args: LockArgs) -> Result<Completion> {
    let config = WorkloadConfig::new(args.size_mb)?;
    let cancel = CancelToken::new();
    cancel.install()?;

    info!(
        size_mb = args.size_mb,
        pid = std::process::id(),
        "starting memory locker"
    );

    let mut region = MemoryRegion::anonymous(config.size_bytes)?;

    // Touch every page so the lock pins real frames, not virtual space.
    info!("filling memory to force allocation");
    let len = region.len();
    let slice = region.as_mut_slice();
    let mut filled = 0;
    while filled < len && !cancel.is_cancelled() {
        let chunk = FILL_CHUNK.min(len - filled);
        slice[filled..filled + chunk].fill(0xaa);
        filled += chunk;
        info!(
            filled_mb = filled / (1024 * 1024),
            total_mb = len / (1024 * 1024),
            "fill progress"
        );
    }
    if cancel.is_cancelled() {
        return Ok(Completion::Interrupted);
    }

    match region.lock() {
        Ok(()) => info!("memory locked"),
        Err(err) => warn!(
            %err,
            "mlock refused (RLIMIT_MEMLOCK, privilege, or memory); holding unlocked"
        ),
    }

    info!("memory locker active, holding until terminated");
    while !cancel.is_cancelled() {
        sleep_interruptible(&cancel, Duration::from_secs(1));
    }

    info!("shutting down, unlocking memory");
    region.unlock();
    Ok(Completion::Full)
}
