//! Order statistics over collected latency samples.

use crate::region::PAGE_SIZE;

/// Append-only sample storage, pre-sized to the expected probe count.
///
/// Capacity is fixed up front so pushes in the timing-sensitive probe loop
/// never reallocate; probes beyond capacity are silently dropped.
#[derive(Debug)]
pub struct SampleSet {
    samples: Vec<u64>,
    capacity: usize,
}

impl SampleSet {
    /// Create storage for up to `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one duration in nanoseconds.
    pub fn push(&mut self, duration_ns: u64) {
        if self.samples.len() < self.capacity {
            self.samples.push(duration_ns);
        }
    }

    /// Number of samples recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Derived statistics over a finalized sample sequence.
///
/// Computed only once the sequence can no longer grow; percentiles come from
/// a full ascending sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyReport {
    /// Number of samples.
    pub count: usize,
    /// Smallest duration in nanoseconds.
    pub min_ns: u64,
    /// Largest duration in nanoseconds.
    pub max_ns: u64,
    /// Arithmetic mean in nanoseconds.
    pub mean_ns: u64,
    /// 50th percentile (nearest-rank).
    pub p50_ns: u64,
    /// 95th percentile (nearest-rank).
    pub p95_ns: u64,
    /// 99th percentile (nearest-rank).
    pub p99_ns: u64,
    /// Sum of all durations in nanoseconds.
    pub total_ns: u64,
}

impl LatencyReport {
    /// Aggregate a finalized sample set.
    ///
    /// Returns `None` for an empty set; the caller omits the block instead of
    /// reporting zeros or NaN. The set is consumed and sorted in place since
    /// it is never reused afterward.
    #[must_use]
    pub fn from_samples(set: SampleSet) -> Option<Self> {
        let mut samples = set.samples;
        if samples.is_empty() {
            return None;
        }
        samples.sort_unstable();

        let count = samples.len();
        let total_ns: u64 = samples.iter().sum();
        Some(Self {
            count,
            min_ns: samples[0],
            max_ns: samples[count - 1],
            mean_ns: total_ns / count as u64,
            p50_ns: nearest_rank(&samples, 50),
            p95_ns: nearest_rank(&samples, 95),
            p99_ns: nearest_rank(&samples, 99),
            total_ns,
        })
    }

    /// Operations per second over the summed sample time.
    #[must_use]
    pub fn ops_per_sec(&self) -> f64 {
        self.count as f64 / (self.total_ns as f64 / 1e9)
    }

    /// Throughput in MB/s for page-granular write-like operations.
    #[must_use]
    pub fn mb_per_sec(&self) -> f64 {
        let bytes = (self.count * PAGE_SIZE) as f64;
        bytes / (1024.0 * 1024.0) / (self.total_ns as f64 / 1e9)
    }
}

/// Nearest-rank percentile: index = floor(p/100 * count), clamped to the last
/// element. No interpolation and no +1 adjustment; this slightly
/// under-estimates high percentiles at small counts but is kept exactly as-is
/// for compatibility with existing reports.
fn nearest_rank(sorted: &[u64], percentile: usize) -> u64 {
    let index = (percentile * sorted.len() / 100).min(sorted.len() - 1);
    sorted[index]
}
