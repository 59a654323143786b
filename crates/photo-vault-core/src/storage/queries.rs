use super::models::*;
use super::sqlite::{format_copied_at, parse_copied_at, Ledger};
use crate::error::Error;
use chrono::{DateTime, Utc};
use rusqlite::{params, Result};
use tracing::{debug, warn};

impl Ledger {
    // ── Identity cache & dedup ───────────────────────────────────

    /// Hash previously recorded for this exact (path, size, mtime) triple.
    pub fn lookup_cached_hash(
        &self,
        origin_path: &str,
        size: i64,
        modification_time: f64,
    ) -> Result<Option<String>> {
        match self.connection().query_row(
            "SELECT content_hash FROM file_record \
             WHERE origin_path = ?1 AND size = ?2 AND modification_time = ?3 \
             LIMIT 1",
            params![origin_path, size, modification_time],
            |row| row.get(0),
        ) {
            Ok(hash) => Ok(Some(hash)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn has_content(&self, content_hash: &str) -> Result<bool> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM file_record WHERE content_hash = ?1",
            params![content_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Recording ────────────────────────────────────────────────

    /// Insert a record. Returns `false` when the hash was already present,
    /// in which case nothing is written.
    pub fn record(&self, entry: &NewFileRecord) -> Result<bool> {
        let inserted = self.connection().execute(
            "INSERT OR IGNORE INTO file_record \
             (origin_path, destination_path, content_hash, size, modification_time, copied_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.origin_path,
                entry.destination_path,
                entry.content_hash,
                entry.size,
                entry.modification_time,
                entry.copied_at,
            ],
        )?;
        if inserted == 0 {
            debug!("Hash {} already recorded, insert ignored", entry.content_hash);
        }
        Ok(inserted == 1)
    }

    // ── Pending retries ──────────────────────────────────────────

    /// Remember a candidate that did not settle this run. Re-marking
    /// replaces the reason.
    pub fn mark_pending(&self, origin_path: &str, reason: &str) -> Result<()> {
        self.connection().execute(
            "INSERT INTO pending_retry (origin_path, reason, marked_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(origin_path) DO UPDATE SET reason = excluded.reason, \
             marked_at = excluded.marked_at",
            params![origin_path, reason, format_copied_at(Utc::now())],
        )?;
        Ok(())
    }

    pub fn clear_pending(&self, origin_path: &str) -> Result<()> {
        self.connection().execute(
            "DELETE FROM pending_retry WHERE origin_path = ?1",
            params![origin_path],
        )?;
        Ok(())
    }

    pub fn pending_paths(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT origin_path FROM pending_retry ORDER BY marked_at, origin_path")?;
        let paths = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>>>()?;
        Ok(paths)
    }

    pub fn pending_count(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM pending_retry", [], |row| row.get(0))
    }

    // ── Reporting ────────────────────────────────────────────────

    /// (origin_path, destination_path) for every record, oldest first.
    pub fn all_records(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.connection().prepare(
            "SELECT origin_path, COALESCE(destination_path, '') FROM file_record ORDER BY id",
        )?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;
        Ok(pairs)
    }

    pub fn records(&self) -> Result<Vec<FileRecord>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, origin_path, destination_path, content_hash, size, \
                    modification_time, copied_at \
             FROM file_record ORDER BY id",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(FileRecord {
                    id: row.get(0)?,
                    origin_path: row.get(1)?,
                    destination_path: row.get(2)?,
                    content_hash: row.get(3)?,
                    size: row.get(4)?,
                    modification_time: row.get(5)?,
                    copied_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn record_count(&self) -> Result<i64> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM file_record", [], |row| row.get(0))
    }

    /// The incremental watermark: the newest `copied_at`, if any.
    pub fn latest_copy_time(&self) -> std::result::Result<Option<DateTime<Utc>>, Error> {
        let raw: Option<String> = self.connection().query_row(
            "SELECT MAX(copied_at) FROM file_record WHERE copied_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(raw.and_then(|raw| {
            let parsed = parse_copied_at(&raw);
            if parsed.is_none() {
                warn!("Ignoring unparsable copied_at '{}' in ledger", raw);
            }
            parsed
        }))
    }
}
