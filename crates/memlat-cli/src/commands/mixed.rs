//! Mixed-workload benchmark command.

use super::Completion;
use crate::output;
use anyhow::Result;
use clap::Args;
use memlat_core::{CancelToken, WorkloadConfig, WorkloadDriver};
use std::time::Duration;

/// Arguments for the mixed benchmark.
#[derive(Args)]
pub struct MixedArgs {
    /// Region size in MB.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub size_mb: u64,

    /// Percentage of operations that are reads (0-100).
    #[arg(default_value_t = 70, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub read_percent: u8,
}

pub fn run(args: MixedArgs) -> Result<Completion> {
    let mut config = WorkloadConfig::new(args.size_mb)?;
    config.read_percent = args.read_percent;
    // 2x the page count for a decent sample size; a shorter settle than the
    // read benchmark since the mixed fill evicts faster.
    config.probe_multiplier = 2;
    config.settle = Duration::from_secs(1);

    let cancel = CancelToken::new();
    cancel.install()?;

    let driver = WorkloadDriver::new(config, cancel)?;
    let outcome = driver.run_mixed()?;
    output::emit(&outcome)?;
    Ok(super::completion(&outcome))
}
