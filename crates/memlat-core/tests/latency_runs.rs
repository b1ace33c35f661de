//! End-to-end workload runs against real anonymous mappings.

use memlat_core::{
    AccessOrder, CancelToken, PatternKind, WorkloadConfig, WorkloadDriver, PAGE_SIZE,
};
use std::time::Duration;

fn config(size_mb: u64) -> WorkloadConfig {
    let mut config = WorkloadConfig::new(size_mb).unwrap();
    // The settling delay exists for real eviction; tests don't need it.
    config.settle = Duration::ZERO;
    config
}

#[test]
fn read_sequential_zero_16mb_tests_all_pages() {
    let mut cfg = config(16);
    cfg.pattern = PatternKind::Zero;
    cfg.access = AccessOrder::Sequential;
    let driver = WorkloadDriver::new(cfg, CancelToken::new()).unwrap();

    let outcome = driver.run_read().unwrap();
    assert!(!outcome.interrupted);

    let report = outcome.report.unwrap();
    assert_eq!(report.test_type, "read_latency");
    assert_eq!(report.size_mb, 16);
    assert_eq!(report.pages_tested, Some(16 * 1024 * 1024 / PAGE_SIZE));

    let stats = report.read_stats.unwrap();
    assert_eq!(stats.count, 4096);
    assert!(stats.min_us >= 0.0);
    assert!(stats.min_us <= stats.p50_us);
    assert!(stats.p50_us <= stats.p99_us);
    assert!(stats.p99_us <= stats.max_us);
    assert!(stats.ops_per_sec > 0.0);
}

#[test]
fn read_stride_visits_reduced_page_set() {
    let mut cfg = config(8);
    cfg.access = AccessOrder::from_code(2).unwrap();
    let driver = WorkloadDriver::new(cfg, CancelToken::new()).unwrap();

    let report = driver.run_read().unwrap().report.unwrap();
    assert_eq!(report.access_pattern, Some("stride"));
    assert_eq!(report.pages_tested, Some(2048usize.div_ceil(16)));
}

#[test]
fn read_random_still_covers_every_page() {
    let mut cfg = config(4);
    cfg.access = AccessOrder::Random;
    let driver = WorkloadDriver::new(cfg, CancelToken::new()).unwrap();

    let report = driver.run_read().unwrap().report.unwrap();
    assert_eq!(report.pages_tested, Some(1024));
}

#[test]
fn mixed_8mb_read_percent_zero_has_no_read_block() {
    let mut cfg = config(8);
    cfg.read_percent = 0;
    cfg.probe_multiplier = 2;
    let driver = WorkloadDriver::new(cfg, CancelToken::new()).unwrap();

    let report = driver.run_mixed().unwrap().report.unwrap();
    assert_eq!(report.test_type, "mixed_latency");
    assert!(report.read_stats.is_none());
    if let Some(write) = &report.write_stats {
        assert!(write.mb_per_sec.is_some());
    }
}

#[test]
fn mixed_8mb_read_percent_100_has_no_write_block() {
    let mut cfg = config(8);
    cfg.read_percent = 100;
    cfg.probe_multiplier = 2;
    let driver = WorkloadDriver::new(cfg, CancelToken::new()).unwrap();

    let report = driver.run_mixed().unwrap().report.unwrap();
    assert!(report.write_stats.is_none());
    let reads = report.read_stats.unwrap();
    assert_eq!(reads.count, 2 * 2048);
    assert_eq!(report.total_operations, Some(2 * 2048));
}

#[test]
fn write_run_reports_visible_discrepancy_not_padding() {
    let mut cfg = config(4);
    cfg.pattern = PatternKind::Random;
    let driver = WorkloadDriver::new(cfg, CancelToken::new()).unwrap();

    let report = driver.run_write().unwrap().report.unwrap();
    let tested = report.pages_tested.unwrap();
    assert!(tested <= 1024);
    match report.write_stats {
        Some(stats) => assert_eq!(stats.count, tested),
        None => assert_eq!(tested, 0),
    }
}

#[test]
fn interrupting_before_probes_still_yields_a_document() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let driver = WorkloadDriver::new(config(4), cancel).unwrap();

    let outcome = driver.run_read().unwrap();
    assert!(outcome.interrupted);
    let report = outcome.report.unwrap();
    assert_eq!(report.pages_tested, Some(0));
    assert!(report.read_stats.is_none());

    // The document must still serialize cleanly with no stats blocks.
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("read_latency"));
    assert!(!json.contains("NaN"));
}

#[test]
fn back_to_back_runs_are_reproducible_in_shape() {
    let driver = WorkloadDriver::new(config(2), CancelToken::new()).unwrap();
    let first = driver.run_read().unwrap().report.unwrap();
    let second = driver.run_read().unwrap().report.unwrap();
    assert_eq!(first.pages_tested, second.pages_tested);
    assert_eq!(
        first.read_stats.unwrap().count,
        second.read_stats.unwrap().count
    );
}
