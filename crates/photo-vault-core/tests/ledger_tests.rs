use chrono::{TimeZone, Utc};
use photo_vault_core::storage::sqlite::{format_copied_at, SCHEMA_VERSION};
use photo_vault_core::storage::{Ledger, NewFileRecord};
use photo_vault_core::Error;
use std::fs;
use tempfile::tempdir;

fn new_record(origin: &str, hash: &str, copied_at: &str) -> NewFileRecord {
    NewFileRecord {
        origin_path: origin.to_string(),
        destination_path: format!("/backup/2023-03/{}", origin.rsplit('/').next().unwrap()),
        content_hash: hash.to_string(),
        size: 10,
        modification_time: 1_678_000_000.0,
        copied_at: copied_at.to_string(),
    }
}

#[test]
fn test_open_is_idempotent_and_keeps_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo-vault.db");

    let ledger = Ledger::open(&path).unwrap();
    assert!(ledger
        .record(&new_record("/src/a.jpg", "h1", "2024-01-01T00:00:00.000000Z"))
        .unwrap());
    drop(ledger);

    let reopened = Ledger::open(&path).unwrap();
    assert_eq!(reopened.record_count().unwrap(), 1);
    let version: i64 = reopened
        .connection()
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[test]
fn test_duplicate_hash_insert_is_ignored() {
    let ledger = Ledger::open_in_memory().unwrap();
    assert!(ledger
        .record(&new_record("/src/a.jpg", "same", "2024-01-01T00:00:00.000000Z"))
        .unwrap());
    assert!(!ledger
        .record(&new_record("/src/copy of a.jpg", "same", "2024-01-02T00:00:00.000000Z"))
        .unwrap());

    let records = ledger.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].origin_path, "/src/a.jpg");
    assert!(ledger.has_content("same").unwrap());
    assert!(!ledger.has_content("other").unwrap());
}

#[test]
fn test_latest_copy_time_is_maximum() {
    let ledger = Ledger::open_in_memory().unwrap();
    assert_eq!(ledger.latest_copy_time().unwrap(), None);

    let early = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap();
    ledger
        .record(&new_record("/src/b.jpg", "h2", &format_copied_at(late)))
        .unwrap();
    ledger
        .record(&new_record("/src/a.jpg", "h1", &format_copied_at(early)))
        .unwrap();

    assert_eq!(ledger.latest_copy_time().unwrap(), Some(late));
}

#[test]
fn test_all_records_lists_pairs_in_insert_order() {
    let ledger = Ledger::open_in_memory().unwrap();
    ledger
        .record(&new_record("/src/a.jpg", "h1", "2024-01-01T00:00:00.000000Z"))
        .unwrap();
    ledger
        .record(&new_record("/src/b.jpg", "h2", "2024-01-01T00:00:01.000000Z"))
        .unwrap();

    let pairs = ledger.all_records().unwrap();
    assert_eq!(
        pairs,
        vec![
            ("/src/a.jpg".to_string(), "/backup/2023-03/a.jpg".to_string()),
            ("/src/b.jpg".to_string(), "/backup/2023-03/b.jpg".to_string()),
        ]
    );
}

#[test]
fn test_peek_on_missing_store_is_no_prior_backup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.db");
    assert_eq!(Ledger::peek_latest_copy_time(&path), None);
    assert!(!path.exists());
}

#[test]
fn test_corrupt_store_peeks_as_empty_but_fails_to_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo-vault.db");
    fs::write(&path, vec![0x42u8; 4096]).unwrap();

    assert_eq!(Ledger::peek_latest_copy_time(&path), None);
    assert!(matches!(
        Ledger::open(&path),
        Err(Error::LedgerUnavailable { .. })
    ));
}

#[test]
fn test_peek_reads_existing_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo-vault.db");
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    {
        let ledger = Ledger::open(&path).unwrap();
        ledger
            .record(&new_record("/src/a.jpg", "h1", &format_copied_at(at)))
            .unwrap();
    }
    assert_eq!(Ledger::peek_latest_copy_time(&path), Some(at));
}

#[test]
fn test_newer_schema_is_refused() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo-vault.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
    }
    assert!(matches!(
        Ledger::open(&path),
        Err(Error::LedgerTooNew { found, .. }) if found == SCHEMA_VERSION + 1
    ));
}

#[test]
fn test_pending_retries_upsert_and_clear() {
    let ledger = Ledger::open_in_memory().unwrap();
    assert!(ledger.pending_paths().unwrap().is_empty());

    ledger.mark_pending("/src/a.jpg", "copy error: disk full").unwrap();
    ledger.mark_pending("/src/b.jpg", "not reached before interruption").unwrap();
    ledger.mark_pending("/src/a.jpg", "hash error: permission denied").unwrap();
    assert_eq!(ledger.pending_count().unwrap(), 2);

    let reason: String = ledger
        .connection()
        .query_row(
            "SELECT reason FROM pending_retry WHERE origin_path = ?1",
            ["/src/a.jpg"],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(reason, "hash error: permission denied");

    ledger.clear_pending("/src/a.jpg").unwrap();
    ledger.clear_pending("/src/never-marked.jpg").unwrap();
    assert_eq!(ledger.pending_paths().unwrap(), vec!["/src/b.jpg".to_string()]);
}

#[test]
fn test_version_one_ledger_gains_retry_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo-vault.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE file_record (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 origin_path TEXT NOT NULL,
                 destination_path TEXT,
                 content_hash TEXT NOT NULL UNIQUE,
                 size INTEGER NOT NULL,
                 modification_time REAL NOT NULL,
                 copied_at TEXT
             );
             INSERT INTO file_record (origin_path, destination_path, content_hash, size, modification_time, copied_at)
             VALUES ('/src/a.jpg', '/backup/2023-03/a.jpg', 'h1', 10, 1.0, '2024-01-01T00:00:00.000000Z');
             PRAGMA user_version = 1;",
        )
        .unwrap();
    }

    let ledger = Ledger::open(&path).unwrap();
    assert_eq!(ledger.record_count().unwrap(), 1);
    ledger.mark_pending("/src/b.jpg", "copy error").unwrap();
    assert_eq!(ledger.pending_count().unwrap(), 1);
}
