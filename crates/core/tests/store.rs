//! Ledger behavior: append-only growth, header discipline, the backup
//! escape hatch, and discovery.

use hotboard_core::model::{HotItem, Snapshot};
use hotboard_core::store::{
    self, AppendOutcome, SnapshotStore, StoreError, CAPTURE_TIME_COLUMN,
    MAX_BACKUP_CELL_CHARS, PAYLOAD_COLUMN,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

fn sample_snapshot(n: usize) -> Snapshot {
    let items = (1..=n)
        .map(|i| HotItem::new(i as u32, &format!("话题{}", i), "简介", "1000"))
        .collect();
    Snapshot::new(items, false)
}

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path)
        .expect("ledger should be readable")
        .lines()
        .count()
}

#[test]
fn appends_accumulate_under_one_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hot_history.csv");
    let ledger = SnapshotStore::new(&path);

    for _ in 0..3 {
        let outcome = ledger.append(&sample_snapshot(2)).expect("append");
        assert_eq!(outcome, AppendOutcome::Primary(path.clone()));
    }

    // Header once, then one line per snapshot.
    assert_eq!(line_count(&path), 4);
    let rows = store::read_ledger(&path).expect("read");
    assert_eq!(rows.len(), 3);
}

#[test]
fn payload_round_trips_through_the_ledger() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hot_history.csv");
    let snapshot = sample_snapshot(3);

    SnapshotStore::new(&path).append(&snapshot).expect("append");

    let rows = store::read_ledger(&path).expect("read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].capture_time, snapshot.capture_time());
    let items = rows[0].items().expect("payload should decode");
    assert_eq!(items, snapshot.items);
}

#[test]
fn reopening_the_store_preserves_existing_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hot_history.csv");

    SnapshotStore::new(&path)
        .append(&sample_snapshot(1))
        .expect("first append");
    // A later run constructs its own store over the same file.
    SnapshotStore::new(&path)
        .append(&sample_snapshot(2))
        .expect("second append");

    let rows = store::read_ledger(&path).expect("read");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].items().expect("decode").len(), 1);
    assert_eq!(rows[1].items().expect("decode").len(), 2);
}

#[test]
fn foreign_header_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("other.csv");
    fs::write(&path, "time,data\n2026-01-01 00:00:00,[]\n").expect("write");

    match store::read_ledger(&path) {
        Err(StoreError::MissingColumns) => {}
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn primary_write_failure_routes_to_backup() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory at the ledger path makes every primary write fail.
    let path = dir.path().join("hot_history.csv");
    fs::create_dir(&path).expect("mkdir");

    let outcome = SnapshotStore::new(&path)
        .append(&sample_snapshot(2))
        .expect("backup should absorb the row");

    let backup = match outcome {
        AppendOutcome::Backup(p) => p,
        AppendOutcome::Primary(p) => panic!("unexpected primary write to {}", p.display()),
    };
    assert!(backup.parent() == Some(dir.path()));

    let rows = store::read_ledger(&backup).expect("read backup");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].items().expect("decode").len(), 2);

    let header = fs::read_to_string(&backup)
        .expect("read")
        .lines()
        .next()
        .map(str::to_string)
        .expect("header line");
    assert_eq!(header, format!("{},{}", CAPTURE_TIME_COLUMN, PAYLOAD_COLUMN));
}

#[test]
fn backup_truncates_oversized_payloads_to_cell_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hot_history.csv");
    fs::create_dir(&path).expect("mkdir");

    // Items built directly, past the constructor's length bounds, to push
    // the payload over the backup cell cap.
    let items: Vec<HotItem> = (1..=20)
        .map(|i| HotItem {
            rank: i,
            title: format!("话题{}", i),
            description: "长".repeat(3_000),
            hot_index: "1000".to_string(),
        })
        .collect();
    let snapshot = Snapshot::new(items, false);
    assert!(snapshot.payload().chars().count() > MAX_BACKUP_CELL_CHARS);

    let outcome = SnapshotStore::new(&path)
        .append(&snapshot)
        .expect("backup should absorb the row");
    let backup = match outcome {
        AppendOutcome::Backup(p) => p,
        AppendOutcome::Primary(p) => panic!("unexpected primary write to {}", p.display()),
    };

    let rows = store::read_ledger(&backup).expect("read backup");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].json_payload.chars().count(), MAX_BACKUP_CELL_CHARS);
    assert_eq!(rows[0].capture_time, snapshot.capture_time());
}

#[test]
fn discover_prefers_primary_then_newest_backup() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert_eq!(store::discover_ledger(dir.path()), None);

    let older = dir.path().join("hot_history_backup_20260101000000.csv");
    let newer = dir.path().join("hot_history_backup_20260102000000.csv");
    fs::write(&older, "capture_time,json_payload\n").expect("write");
    fs::write(&newer, "capture_time,json_payload\n").expect("write");
    assert_eq!(store::discover_ledger(dir.path()), Some(newer.clone()));

    let primary = dir.path().join(store::DEFAULT_LEDGER_NAME);
    fs::write(&primary, "capture_time,json_payload\n").expect("write");
    assert_eq!(store::discover_ledger(dir.path()), Some(primary));

    let backups = store::list_backups(dir.path());
    assert_eq!(backups, vec![older, newer]);
}
