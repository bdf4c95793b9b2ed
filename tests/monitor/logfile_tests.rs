use crate::common::create_temp_dir;
use linkpulse::core::monitor::{CycleLog, CycleRecord};

fn record(timestamp_ms: i64, latency: f64, down: f64, up: f64) -> CycleRecord {
    CycleRecord {
        timestamp_ms,
        latency_ms: latency,
        download: down,
        upload: up,
    }
}

#[test]
fn ensure_exists_creates_file_with_header_only() {
    let dir = create_temp_dir();
    let log = CycleLog::at(dir.path().join("linkpulse.csv"));

    log.ensure_exists().unwrap();

    let contents = log.contents().unwrap();
    assert_eq!(contents, "date,latency,down,up\n");
}

#[test]
fn ensure_exists_leaves_existing_contents_untouched() {
    let dir = create_temp_dir();
    let log = CycleLog::at(dir.path().join("linkpulse.csv"));

    log.ensure_exists().unwrap();
    log.append(&record(1000, 12.3, 90000.0, 5000.0)).unwrap();
    log.ensure_exists().unwrap();

    let contents = log.contents().unwrap();
    assert_eq!(contents.lines().count(), 2);
}

#[test]
fn n_cycles_produce_n_plus_one_lines_in_order() {
    let dir = create_temp_dir();
    let log = CycleLog::at(dir.path().join("linkpulse.csv"));

    for i in 0..5i64 {
        log.append(&record(1000 + i, 10.0 + i as f64, 2.0, 1.0)).unwrap();
    }

    let contents = log.contents().unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "date,latency,down,up");

    let timestamps: Vec<i64> = lines[1..]
        .iter()
        .map(|line| line.split(',').next().unwrap().parse().unwrap())
        .collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted);
}

#[test]
fn append_to_missing_file_writes_header_first() {
    let dir = create_temp_dir();
    let log = CycleLog::at(dir.path().join("linkpulse.csv"));

    log.append(&record(42, -1.0, -1.0, -1.0)).unwrap();

    let contents = log.contents().unwrap();
    assert_eq!(contents, "date,latency,down,up\n42,-1,-1,-1\n");
}

#[test]
fn clear_recreates_file_containing_only_the_header() {
    let dir = create_temp_dir();
    let log = CycleLog::at(dir.path().join("linkpulse.csv"));

    log.append(&record(1, 10.0, 2.0, 1.0)).unwrap();
    log.clear().unwrap();

    let contents = log.contents().unwrap();
    assert_eq!(contents, "date,latency,down,up\n");
}

#[test]
fn clear_works_when_the_file_is_absent() {
    let dir = create_temp_dir();
    let log = CycleLog::at(dir.path().join("linkpulse.csv"));

    log.clear().unwrap();

    assert_eq!(log.contents().unwrap(), "date,latency,down,up\n");
}
