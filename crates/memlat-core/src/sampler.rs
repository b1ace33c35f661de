//! Timing of single page operations.
//!
//! Each probe touches exactly one byte of one page so the page-fault or
//! decompress cost is not confounded with a larger copy, and captures a
//! monotonic timestamp immediately before and after. Durations saturate at
//! zero if clock non-monotonicity is ever observed.

use crate::region::MemoryRegion;
use std::time::Instant;

/// Time one faulting read of a page. Never fails.
#[must_use]
pub fn timed_read(region: &MemoryRegion, page: usize) -> u64 {
    let start = Instant::now();
    let _value = region.read_byte(page);
    let end = Instant::now();
    duration_ns(start, end)
}

/// Time a store into a page followed by an eviction hint for that page.
///
/// Returns `None` if the kernel refused the eviction: a refused hint is a
/// non-event and recording it would pollute the percentiles.
#[must_use]
pub fn timed_write(region: &mut MemoryRegion, page: usize, value: u8) -> Option<u64> {
    let start = Instant::now();
    region.write_byte(page, value);
    let accepted = region.pageout(page);
    let end = Instant::now();
    accepted.then(|| duration_ns(start, end))
}

/// Time an eviction hint for an already-resident page, without a prior write.
///
/// This is the pure write-latency mode: the eviction itself is the measured
/// operation. Returns `None` if the kernel refused the hint.
#[must_use]
pub fn timed_evict(region: &MemoryRegion, page: usize) -> Option<u64> {
    let start = Instant::now();
    let accepted = region.pageout(page);
    let end = Instant::now();
    accepted.then(|| duration_ns(start, end))
}

fn duration_ns(start: Instant, end: Instant) -> u64 {
    u64::try_from(end.saturating_duration_since(start).as_nanos()).unwrap_or(u64::MAX)
}
