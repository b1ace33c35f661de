//! Read-latency benchmark command.

use super::Completion;
use crate::output;
use anyhow::Result;
use clap::Args;
use memlat_core::{AccessOrder, CancelToken, PatternKind, WorkloadConfig, WorkloadDriver};

/// Arguments for the read benchmark.
#[derive(Args)]
pub struct ReadArgs {
    /// Region size in MB.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub size_mb: u64,

    /// Access pattern: 0=sequential, 1=random, 2=stride (every 16th page).
    #[arg(default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub access: u8,
}

pub fn run(args: ReadArgs) -> Result<Completion> {
    let mut config = WorkloadConfig::new(args.size_mb)?;
    config.pattern = PatternKind::Sequential;
    config.access =
        AccessOrder::from_code(args.access).ok_or_else(|| anyhow::anyhow!("bad access code"))?;

    let cancel = CancelToken::new();
    cancel.install()?;

    let driver = WorkloadDriver::new(config, cancel)?;
    let outcome = driver.run_read()?;
    output::emit(&outcome)?;
    Ok(super::completion(&outcome))
}
