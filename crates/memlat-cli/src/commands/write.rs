//! Write-latency benchmark command.

use super::Completion;
use crate::output;
use anyhow::Result;
use clap::Args;
use memlat_core::{CancelToken, PatternKind, WorkloadConfig, WorkloadDriver};

/// Arguments for the write benchmark.
#[derive(Args)]
pub struct WriteArgs {
    /// Region size in MB.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub size_mb: u64,

    /// Fill pattern: 0=mixed, 1=random, 2=zeros, 3=sequential.
    #[arg(default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub pattern: u8,
}

pub fn run(args: WriteArgs) -> Result<Completion> {
    let mut config = WorkloadConfig::new(args.size_mb)?;
    config.pattern =
        PatternKind::from_code(args.pattern).ok_or_else(|| anyhow::anyhow!("bad pattern code"))?;

    let cancel = CancelToken::new();
    cancel.install()?;

    let driver = WorkloadDriver::new(config, cancel)?;
    let outcome = driver.run_write()?;
    output::emit(&outcome)?;
    Ok(super::completion(&outcome))
}
