use bufctl::printer::format_report;
use bufctl::workload::{init_pages, peek, scan, touch};
use tempfile::TempDir;

#[test]
fn test_init_then_scan_reports_every_page() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages.db");

    let allocated = init_pages(&path, 4, 10).unwrap();
    assert_eq!(allocated, (1..=10).collect::<Vec<_>>());

    let report = scan(&path, 4, 2).unwrap();
    assert_eq!(report.pages, 10);
    assert!(report.mismatched.is_empty());
    assert_eq!(report.stats.hits + report.stats.misses, 20);
    assert_eq!(report.stats.write_backs, 0);
    assert_eq!(report.frames.len(), 4);
    assert!(format_report(&report).contains("scanned 10 pages x 2 passes"));
}

#[test]
fn test_pool_larger_than_file_only_misses_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages.db");
    init_pages(&path, 2, 5).unwrap();

    let report = scan(&path, 8, 3).unwrap();
    assert_eq!(report.stats.misses, 5);
    assert_eq!(report.stats.hits, 10);
    assert_eq!(report.stats.evictions, 0);
}

#[test]
fn test_touch_is_flushed_on_close() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages.db");
    init_pages(&path, 2, 3).unwrap();

    touch(&path, 2, 2, "hello pages").unwrap();
    assert_eq!(peek(&path, 2, 11).unwrap(), "hello pages");

    // stamp is untouched
    assert!(scan(&path, 2, 1).unwrap().mismatched.is_empty());
}

#[test]
fn test_zero_frames_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages.db");
    let err = scan(&path, 0, 1).unwrap_err();
    assert!(err.to_string().contains("frame count"));
}

#[test]
fn test_touch_missing_page_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pages.db");
    init_pages(&path, 2, 1).unwrap();
    assert!(touch(&path, 2, 5, "x").is_err());
}
