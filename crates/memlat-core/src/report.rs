//! The structured result document emitted once per run.

use crate::stats::LatencyReport;
use serde::Serialize;

/// One named statistics block (microseconds, two implied decimals).
#[derive(Debug, Clone, Serialize)]
pub struct StatsBlock {
    /// Number of samples behind this block.
    pub count: usize,
    /// Minimum latency in microseconds.
    pub min_us: f64,
    /// Maximum latency in microseconds.
    pub max_us: f64,
    /// Mean latency in microseconds.
    pub avg_us: f64,
    /// 50th percentile in microseconds.
    pub p50_us: f64,
    /// 95th percentile in microseconds.
    pub p95_us: f64,
    /// 99th percentile in microseconds.
    pub p99_us: f64,
    /// Operations per second over the summed sample time.
    pub ops_per_sec: f64,
    /// Page-granular throughput; only present for write-like blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mb_per_sec: Option<f64>,
}

impl StatsBlock {
    /// Render a latency report as a block. `write_like` adds MB/s.
    #[must_use]
    pub fn from_report(report: &LatencyReport, write_like: bool) -> Self {
        Self {
            count: report.count,
            min_us: us(report.min_ns),
            max_us: us(report.max_ns),
            avg_us: us(report.mean_ns),
            p50_us: us(report.p50_ns),
            p95_us: us(report.p95_ns),
            p99_us: us(report.p99_ns),
            ops_per_sec: report.ops_per_sec(),
            mb_per_sec: write_like.then(|| report.mb_per_sec()),
        }
    }
}

// Microseconds at two decimals, the report's documented resolution.
fn us(ns: u64) -> f64 {
    (ns as f64 / 10.0).round() / 100.0
}

/// The self-contained report for one invocation.
///
/// Parameters are echoed back so the document stands alone; statistics blocks
/// are present only for operation kinds that produced at least one sample.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Which benchmark produced this report.
    pub test_type: &'static str,
    /// Configured region size in MB.
    pub size_mb: u64,
    /// Access order name, for benchmarks that select one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_pattern: Option<&'static str>,
    /// Fill pattern name, for benchmarks that select one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<&'static str>,
    /// Read/write mix as "R/W" percentages, for the mixed benchmark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_write_ratio: Option<String>,
    /// Pages that actually produced a sample; may be below the nominal page
    /// count when eviction hints were refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_tested: Option<usize>,
    /// Total probes across both operation kinds, for the mixed benchmark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_operations: Option<usize>,
    /// Read-latency statistics, if any read produced a sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_stats: Option<StatsBlock>,
    /// Write-latency statistics, if any write produced a sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_stats: Option<StatsBlock>,
}

impl RunReport {
    /// Skeleton report with all optional fields absent.
    #[must_use]
    pub fn new(test_type: &'static str, size_mb: u64) -> Self {
        Self {
            test_type,
            size_mb,
            access_pattern: None,
            pattern: None,
            read_write_ratio: None,
            pages_tested: None,
            total_operations: None,
            read_stats: None,
            write_stats: None,
        }
    }
}
