//! Workload driver: fill, evict, settle, probe, report.
//!
//! Single-threaded and synchronous: every phase runs to completion (or
//! interruption) before the next begins, so timing is free of in-process
//! interference. The cancellation token is polled between pages and probes,
//! never inside a timed operation; an interrupted run still reports the
//! samples collected so far.

use crate::cancel::{sleep_interruptible, CancelToken};
use crate::error::{Error, Result};
use crate::pattern::{self, PatternKind};
use crate::region::{MemoryRegion, PAGE_SIZE};
use crate::report::{RunReport, StatsBlock};
use crate::rng::Lcg;
use crate::sampler;
use crate::stats::{LatencyReport, SampleSet};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Stride between probed pages in stride access order.
pub const STRIDE_PAGES: usize = 16;

/// Fill granularity; cancellation is checked between chunks.
const FILL_CHUNK: usize = 256 * PAGE_SIZE;

/// Chunk size for the pressure fill (matches its progress reporting).
const PRESSURE_CHUNK: usize = 64 * 1024 * 1024;

/// Byte step for the pressure touch passes.
const TOUCH_STEP: usize = 64 * 1024;

/// Probe-loop progress reporting interval.
const PROGRESS_INTERVAL: usize = 1000;

/// Pause between pressure touch passes.
const PASS_PAUSE: Duration = Duration::from_millis(300);

/// Order in which pages are probed during measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOrder {
    /// Page index 0..N-1 in order.
    Sequential,
    /// Fixed-seed shuffle of 0..N-1; a full permutation, reproducible across
    /// runs with the same input size.
    Random,
    /// Every Nth page only, strictly increasing (reduced effective count).
    Stride(usize),
}

impl AccessOrder {
    /// Parse the numeric code used on the command line (0-2).
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Sequential),
            1 => Some(Self::Random),
            2 => Some(Self::Stride(STRIDE_PAGES)),
            _ => None,
        }
    }

    /// Human-readable name echoed back in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::Stride(_) => "stride",
        }
    }

    /// The sequence of page indices a probe loop visits.
    pub fn indices(self, num_pages: usize, rng: &mut Lcg) -> Vec<usize> {
        match self {
            Self::Sequential => (0..num_pages).collect(),
            Self::Random => {
                let mut order: Vec<usize> = (0..num_pages).collect();
                // Fisher-Yates with the shared fixed-seed generator.
                for i in 0..num_pages.saturating_sub(1) {
                    let j = i + rng.next_below((num_pages - i) as u64) as usize;
                    order.swap(i, j);
                }
                order
            }
            Self::Stride(stride) => (0..num_pages).step_by(stride.max(1)).collect(),
        }
    }
}

/// Immutable run parameters, validated once before any resource is acquired.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Region size in bytes; a non-zero multiple of [`PAGE_SIZE`].
    pub size_bytes: usize,
    /// Fill pattern applied during setup.
    pub pattern: PatternKind,
    /// Probe access order.
    pub access: AccessOrder,
    /// Percentage of probes that are reads in the mixed workload (0-100).
    pub read_percent: u8,
    /// How long a pressure run holds the region before exiting.
    pub hold: Duration,
    /// Probes issued per page in the mixed workload.
    pub probe_multiplier: usize,
    /// Delay after bulk eviction so the kernel can finish it asynchronously;
    /// probing earlier would understate latency.
    pub settle: Duration,
}

impl WorkloadConfig {
    /// Build a config for `size_mb` megabytes with default parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the size is zero or overflows.
    pub fn new(size_mb: u64) -> Result<Self> {
        let bytes = size_mb
            .checked_mul(1024 * 1024)
            .and_then(|b| usize::try_from(b).ok())
            .filter(|&b| b >= PAGE_SIZE)
            .ok_or_else(|| {
                Error::InvalidConfig(format!("size_mb {size_mb} is zero or too large"))
            })?;
        Ok(Self {
            // Whole pages only.
            size_bytes: bytes - bytes % PAGE_SIZE,
            pattern: PatternKind::Mixed,
            access: AccessOrder::Sequential,
            read_percent: 70,
            hold: Duration::ZERO,
            probe_multiplier: 1,
            settle: Duration::from_secs(2),
        })
    }

    /// Region size in whole pages.
    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.size_bytes / PAGE_SIZE
    }

    /// Configured size in MB, as echoed in reports.
    #[must_use]
    pub fn size_mb(&self) -> u64 {
        (self.size_bytes / (1024 * 1024)) as u64
    }

    fn validate(&self) -> Result<()> {
        if self.size_bytes == 0 || self.size_bytes % PAGE_SIZE != 0 {
            return Err(Error::InvalidConfig(format!(
                "size_bytes {} is not a non-zero multiple of the page size",
                self.size_bytes
            )));
        }
        if self.read_percent > 100 {
            return Err(Error::InvalidConfig(format!(
                "read_percent {} exceeds 100",
                self.read_percent
            )));
        }
        if self.probe_multiplier == 0 {
            return Err(Error::InvalidConfig(
                "probe_multiplier must be at least 1".to_string(),
            ));
        }
        if let AccessOrder::Stride(0) = self.access {
            return Err(Error::InvalidConfig("stride must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// What a finished (or interrupted) run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// The result document; absent for runs that do not measure latency.
    pub report: Option<RunReport>,
    /// Whether the run was cut short by cancellation. The report, if any,
    /// still covers every sample collected before the interruption.
    pub interrupted: bool,
}

/// Owns the memory region for a run and sequences its phases.
pub struct WorkloadDriver {
    config: WorkloadConfig,
    cancel: CancelToken,
}

impl WorkloadDriver {
    /// Validate the config and build a driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any parameter is out of range.
    pub fn new(config: WorkloadConfig, cancel: CancelToken) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, cancel })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Read-latency benchmark: fill, bulk-evict, settle, then time one
    /// faulting read per page in the configured access order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Map`] if the region cannot be mapped.
    pub fn run_read(&self) -> Result<RunOutcome> {
        let num_pages = self.config.num_pages();
        info!(
            size_mb = self.config.size_mb(),
            pages = num_pages,
            access = self.config.access.name(),
            "starting read latency test"
        );

        let mut region = MemoryRegion::anonymous(self.config.size_bytes)?;
        region.advise_sequential(matches!(self.config.access, AccessOrder::Sequential));

        self.fill(&mut region);
        if !self.cancel.is_cancelled() {
            self.evict_all(&region);
        }
        self.settle();

        let order = self
            .config
            .access
            .indices(num_pages, &mut Lcg::default());
        let mut samples = SampleSet::with_capacity(order.len());

        info!(probes = order.len(), "measuring read latency");
        for (i, &page) in order.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            samples.push(sampler::timed_read(&region, page));
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                debug!(tested = i + 1, total = order.len(), "read probes");
            }
        }

        let mut report = RunReport::new("read_latency", self.config.size_mb());
        report.access_pattern = Some(self.config.access.name());
        report.pages_tested = Some(samples.len());
        report.read_stats = LatencyReport::from_samples(samples)
            .map(|r| StatsBlock::from_report(&r, false));
        Ok(self.finish(report))
    }

    /// Write-latency benchmark: fill with the configured pattern, then time
    /// an eviction hint per page. No bulk-evict phase; the eviction is the
    /// measured operation. Refused hints drop the sample, so `pages_tested`
    /// can fall below the nominal page count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Map`] if the region cannot be mapped.
    pub fn run_write(&self) -> Result<RunOutcome> {
        let num_pages = self.config.num_pages();
        info!(
            size_mb = self.config.size_mb(),
            pages = num_pages,
            pattern = self.config.pattern.name(),
            "starting write latency test"
        );

        let mut region = MemoryRegion::anonymous(self.config.size_bytes)?;
        self.fill(&mut region);

        let mut samples = SampleSet::with_capacity(num_pages);
        if !self.cancel.is_cancelled() {
            info!("measuring write latency (forcing page-out)");
            for page in 0..num_pages {
                if self.cancel.is_cancelled() {
                    break;
                }
                if let Some(ns) = sampler::timed_evict(&region, page) {
                    samples.push(ns);
                }
                if (page + 1) % PROGRESS_INTERVAL == 0 {
                    debug!(tested = page + 1, total = num_pages, "write probes");
                }
            }
        }

        let mut report = RunReport::new("write_latency", self.config.size_mb());
        report.pattern = Some(self.config.pattern.name());
        report.pages_tested = Some(samples.len());
        report.write_stats = LatencyReport::from_samples(samples)
            .map(|r| StatsBlock::from_report(&r, true));
        Ok(self.finish(report))
    }

    /// Mixed-workload benchmark: random page targets, per-probe read/write
    /// selection against the configured read percentage, separate sample
    /// sequences per operation kind. The region is always filled with one
    /// repeated byte per page; the configured fill pattern does not apply
    /// here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Map`] if the region cannot be mapped.
    pub fn run_mixed(&self) -> Result<RunOutcome> {
        let num_pages = self.config.num_pages();
        let read_pct = self.config.read_percent;
        info!(
            size_mb = self.config.size_mb(),
            pages = num_pages,
            read_percent = read_pct,
            "starting mixed workload latency test"
        );

        let mut region = MemoryRegion::anonymous(self.config.size_bytes)?;
        region.advise_sequential(false);

        self.fill_page_repeated(&mut region);
        if !self.cancel.is_cancelled() {
            self.evict_all(&region);
        }
        self.settle();

        let operations = num_pages * self.config.probe_multiplier;
        let mut read_samples = SampleSet::with_capacity(operations);
        let mut write_samples = SampleSet::with_capacity(operations);
        let mut rng = Lcg::default();

        info!(operations, "running mixed workload");
        for op in 0..operations {
            if self.cancel.is_cancelled() {
                break;
            }
            let page = rng.next_below(num_pages as u64) as usize;
            let is_read = rng.next_below(100) < u64::from(read_pct);
            if is_read {
                read_samples.push(sampler::timed_read(&region, page));
            } else if let Some(ns) = sampler::timed_write(&mut region, page, (op % 256) as u8) {
                write_samples.push(ns);
            }
            if (op + 1) % PROGRESS_INTERVAL == 0 {
                debug!(
                    done = op + 1,
                    total = operations,
                    reads = read_samples.len(),
                    writes = write_samples.len(),
                    "mixed probes"
                );
            }
        }

        let mut report = RunReport::new("mixed_latency", self.config.size_mb());
        report.read_write_ratio = Some(format!("{}/{}", read_pct, 100 - read_pct));
        report.total_operations = Some(read_samples.len() + write_samples.len());
        report.read_stats = LatencyReport::from_samples(read_samples)
            .map(|r| StatsBlock::from_report(&r, false));
        report.write_stats = LatencyReport::from_samples(write_samples)
            .map(|r| StatsBlock::from_report(&r, true));
        Ok(self.finish(report))
    }

    /// Pressure run: fill quickly, force swapping with coarse touch passes,
    /// then hold the region for the configured duration. Produces no latency
    /// report; its purpose is the memory pressure itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Map`] if the region cannot be mapped.
    pub fn run_pressure(&self) -> Result<RunOutcome> {
        info!(
            size_mb = self.config.size_mb(),
            pattern = self.config.pattern.name(),
            hold_secs = self.config.hold.as_secs(),
            "starting memory pressure run"
        );

        let mut region = MemoryRegion::anonymous(self.config.size_bytes)?;

        // Coarse chunks with a fill-rate log, rather than the benchmark fill.
        let fill_start = Instant::now();
        let len = region.len();
        let slice = region.as_mut_slice();
        let mut rng = Lcg::default();
        let mut filled = 0;
        while filled < len && !self.cancel.is_cancelled() {
            let chunk = PRESSURE_CHUNK.min(len - filled);
            pattern::fill(
                &mut slice[filled..filled + chunk],
                self.config.pattern,
                filled,
                &mut rng,
            );
            filled += chunk;
            let elapsed = fill_start.elapsed().as_secs_f64().max(1e-9);
            let rate_mb_s = filled as f64 / (1024.0 * 1024.0) / elapsed;
            info!(
                filled_mb = filled / (1024 * 1024),
                total_mb = len / (1024 * 1024),
                rate_mb_s,
                "fill progress"
            );
        }

        if !self.cancel.is_cancelled() {
            info!("forcing memory to swap (3 passes)");
            for pass in 0..3 {
                if self.cancel.is_cancelled() {
                    break;
                }
                debug!(pass = pass + 1, "touch pass");
                let slice = region.as_mut_slice();
                let mut offset = 0;
                while offset < slice.len() {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    slice[offset] = slice[offset].wrapping_add(1);
                    offset += TOUCH_STEP;
                }
                if !sleep_interruptible(&self.cancel, PASS_PAUSE) {
                    break;
                }
            }
        }

        if !self.cancel.is_cancelled() && !self.config.hold.is_zero() {
            info!(hold_secs = self.config.hold.as_secs(), "holding memory");
            sleep_interruptible(&self.cancel, self.config.hold);
        }

        let interrupted = self.cancel.is_cancelled();
        info!(interrupted, "pressure run complete, releasing memory");
        Ok(RunOutcome {
            report: None,
            interrupted,
        })
    }

    /// Fill the whole region with the configured pattern, checking the
    /// cancellation flag between chunks.
    fn fill(&self, region: &mut MemoryRegion) {
        info!(pattern = self.config.pattern.name(), "filling memory");
        let start = Instant::now();
        let len = region.len();
        let slice = region.as_mut_slice();
        let mut rng = Lcg::default();
        let mut offset = 0;
        while offset < len {
            if self.cancel.is_cancelled() {
                debug!(offset, "fill interrupted");
                return;
            }
            let chunk = FILL_CHUNK.min(len - offset);
            pattern::fill(
                &mut slice[offset..offset + chunk],
                self.config.pattern,
                offset,
                &mut rng,
            );
            offset += chunk;
        }
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "fill complete");
    }

    /// Fill every page with its repeated identifying byte (`page % 256`),
    /// the mixed benchmark's fixed profile, checking cancellation between
    /// chunks.
    fn fill_page_repeated(&self, region: &mut MemoryRegion) {
        info!("filling memory (repeated byte per page)");
        let start = Instant::now();
        let len = region.len();
        let slice = region.as_mut_slice();
        let mut offset = 0;
        while offset < len {
            if self.cancel.is_cancelled() {
                debug!(offset, "fill interrupted");
                return;
            }
            let chunk = FILL_CHUNK.min(len - offset);
            pattern::fill_page_repeated(&mut slice[offset..offset + chunk], offset);
            offset += chunk;
        }
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "fill complete");
    }

    /// Issue an eviction hint for every page so the probe phase reliably
    /// faults on first touch. Refusals only reduce how many pages are cold.
    fn evict_all(&self, region: &MemoryRegion) {
        info!("forcing pages out of resident memory");
        let num_pages = region.num_pages();
        let mut accepted = 0usize;
        for page in 0..num_pages {
            if self.cancel.is_cancelled() {
                break;
            }
            if region.pageout(page) {
                accepted += 1;
            }
        }
        info!(accepted, pages = num_pages, "bulk eviction hints issued");
    }

    /// Wait out the post-eviction settling delay, interruptibly.
    fn settle(&self) {
        if self.cancel.is_cancelled() || self.config.settle.is_zero() {
            return;
        }
        info!(
            settle_ms = self.config.settle.as_millis() as u64,
            "waiting for eviction to complete"
        );
        sleep_interruptible(&self.cancel, self.config.settle);
    }

    fn finish(&self, report: RunReport) -> RunOutcome {
        let interrupted = self.cancel.is_cancelled();
        info!(interrupted, "test complete, calculating statistics");
        RunOutcome {
            report: Some(report),
            interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(size_mb: u64) -> WorkloadConfig {
        let mut config = WorkloadConfig::new(size_mb).unwrap();
        config.settle = Duration::ZERO;
        config
    }

    #[test]
    fn test_config_rejects_zero_size() {
        assert!(WorkloadConfig::new(0).is_err());
    }

    #[test]
    fn test_config_rejects_overflowing_size() {
        assert!(WorkloadConfig::new(u64::MAX).is_err());
    }

    #[test]
    fn test_config_whole_pages() {
        let config = WorkloadConfig::new(16).unwrap();
        assert_eq!(config.size_bytes % PAGE_SIZE, 0);
        assert_eq!(config.num_pages(), 4096);
        assert_eq!(config.size_mb(), 16);
    }

    #[test]
    fn test_config_rejects_read_percent_above_100() {
        let mut config = quick_config(1);
        config.read_percent = 101;
        assert!(WorkloadDriver::new(config, CancelToken::new()).is_err());
    }

    #[test]
    fn test_config_rejects_zero_probe_multiplier() {
        let mut config = quick_config(1);
        config.probe_multiplier = 0;
        assert!(WorkloadDriver::new(config, CancelToken::new()).is_err());
    }

    #[test]
    fn test_access_order_codes() {
        assert_eq!(AccessOrder::from_code(0), Some(AccessOrder::Sequential));
        assert_eq!(AccessOrder::from_code(1), Some(AccessOrder::Random));
        assert_eq!(
            AccessOrder::from_code(2),
            Some(AccessOrder::Stride(STRIDE_PAGES))
        );
        assert_eq!(AccessOrder::from_code(3), None);
    }

    #[test]
    fn test_sequential_order_is_identity() {
        let order = AccessOrder::Sequential.indices(5, &mut Lcg::default());
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_random_order_is_permutation() {
        let n = 1024;
        let mut order = AccessOrder::Random.indices(n, &mut Lcg::default());
        assert_ne!(order, (0..n).collect::<Vec<_>>());
        order.sort_unstable();
        assert_eq!(order, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_order_reproducible() {
        let a = AccessOrder::Random.indices(256, &mut Lcg::default());
        let b = AccessOrder::Random.indices(256, &mut Lcg::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_stride_order_properties() {
        let n = 1000;
        let stride = STRIDE_PAGES;
        let order = AccessOrder::Stride(stride).indices(n, &mut Lcg::default());
        assert_eq!(order.len(), n.div_ceil(stride));
        assert!(order.iter().all(|&idx| idx % stride == 0));
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_read_run_samples_every_page() {
        let config = quick_config(1);
        let driver = WorkloadDriver::new(config, CancelToken::new()).unwrap();
        let outcome = driver.run_read().unwrap();
        assert!(!outcome.interrupted);

        let report = outcome.report.unwrap();
        assert_eq!(report.pages_tested, Some(256));
        let stats = report.read_stats.unwrap();
        assert_eq!(stats.count, 256);
        assert!(stats.min_us <= stats.p50_us);
        assert!(stats.p50_us <= stats.p95_us);
        assert!(stats.p99_us <= stats.max_us);
    }

    #[test]
    fn test_write_run_never_exceeds_page_count() {
        let config = quick_config(1);
        let driver = WorkloadDriver::new(config, CancelToken::new()).unwrap();
        let outcome = driver.run_write().unwrap();
        let report = outcome.report.unwrap();
        // Refused eviction hints are dropped, so the tested count is a
        // visible discrepancy, never padding.
        assert!(report.pages_tested.unwrap() <= 256);
        assert!(report.read_stats.is_none());
    }

    #[test]
    fn test_mixed_run_all_writes_when_read_percent_zero() {
        let mut config = quick_config(1);
        config.read_percent = 0;
        config.probe_multiplier = 2;
        let driver = WorkloadDriver::new(config, CancelToken::new()).unwrap();
        let report = driver.run_mixed().unwrap().report.unwrap();
        assert!(report.read_stats.is_none());
        assert_eq!(report.read_write_ratio.as_deref(), Some("0/100"));
    }

    #[test]
    fn test_mixed_run_all_reads_when_read_percent_100() {
        let mut config = quick_config(1);
        config.read_percent = 100;
        config.probe_multiplier = 2;
        let driver = WorkloadDriver::new(config, CancelToken::new()).unwrap();
        let report = driver.run_mixed().unwrap().report.unwrap();
        assert!(report.write_stats.is_none());
        assert_eq!(report.total_operations, Some(2 * 256));
        assert_eq!(report.read_stats.unwrap().count, 2 * 256);
    }

    #[test]
    fn test_cancelled_run_still_reports() {
        let config = quick_config(1);
        let cancel = CancelToken::new();
        cancel.cancel();
        let driver = WorkloadDriver::new(config, cancel).unwrap();
        let outcome = driver.run_read().unwrap();
        assert!(outcome.interrupted);
        // No probes ran, so the stats block is absent but the document exists.
        let report = outcome.report.unwrap();
        assert_eq!(report.pages_tested, Some(0));
        assert!(report.read_stats.is_none());
    }

    #[test]
    fn test_pressure_run_completes_without_report() {
        let mut config = quick_config(1);
        config.hold = Duration::ZERO;
        let driver = WorkloadDriver::new(config, CancelToken::new()).unwrap();
        let outcome = driver.run_pressure().unwrap();
        assert!(!outcome.interrupted);
        assert!(outcome.report.is_none());
    }
}
