//! Memory pressure command: allocate, fill, and hold.

use super::Completion;
use anyhow::Result;
use clap::Args;
use memlat_core::{CancelToken, PatternKind, WorkloadConfig, WorkloadDriver};
use std::time::Duration;

/// Arguments for the pressure run.
#[derive(Args)]
pub struct PressureArgs {
    /// Region size in MB.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub size_mb: u64,

    /// Fill pattern: 0=mixed, 1=random, 2=zeros, 3=sequential.
    #[arg(default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub pattern: u8,

    /// How long to hold the memory before exiting, in seconds.
    #[arg(default_value_t = 15)]
    pub hold_seconds: u64,
}

pub fn run(args: PressureArgs) -> Result<Completion> {
    let mut config = WorkloadConfig::new(args.size_mb)?;
    config.pattern =
        PatternKind::from_code(args.pattern).ok_or_else(|| anyhow::anyhow!("bad pattern code"))?;
    config.hold = Duration::from_secs(args.hold_seconds);

    let cancel = CancelToken::new();
    cancel.install()?;

    let driver = WorkloadDriver::new(config, cancel)?;
    let outcome = driver.run_pressure()?;
    Ok(super::completion(&outcome))
}
