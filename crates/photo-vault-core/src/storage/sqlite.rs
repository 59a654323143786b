use crate::error::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

/// Bumped whenever `schema.sql` changes shape. Stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 2;

/// The persistent record of every file copied into a destination root.
///
/// It is the single authority for "has this content been backed up before"
/// and for the incremental watermark.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Open or create the ledger. Any failure here means the run cannot
    /// guarantee dedup or resumability, so it is reported as
    /// [`Error::LedgerUnavailable`].
    pub fn open(path: &Path) -> Result<Self, Error> {
        let unavailable = |source| Error::LedgerUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(unavailable)?;
        let ledger = Ledger { conn };
        ledger.configure_pragmas().map_err(unavailable)?;
        ledger.migrate_schema(path)?;
        Ok(ledger)
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        let ledger = Ledger { conn };
        ledger.migrate_schema(Path::new(":memory:"))?;
        Ok(ledger)
    }

    /// Open an existing ledger without creating or migrating anything.
    pub fn open_read_only(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::LedgerUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Ledger { conn })
    }

    /// Time of the most recent copy, or `None` when there is no usable
    /// ledger at `path`. Never creates the file and never fails.
    pub fn peek_latest_copy_time(path: &Path) -> Option<DateTime<Utc>> {
        if !path.is_file() {
            return None;
        }
        match Self::open_read_only(path).and_then(|ledger| ledger.latest_copy_time()) {
            Ok(latest) => latest,
            Err(e) => {
                debug!("Treating {} as no prior backup: {}", path.display(), e);
                None
            }
        }
    }

    fn configure_pragmas(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode)");
        Ok(())
    }

    /// Create the table and indexes if missing. Existing data is never touched.
    fn migrate_schema(&self, path: &Path) -> Result<(), Error> {
        let unavailable = |source| Error::LedgerUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(unavailable)?;

        if version > SCHEMA_VERSION {
            return Err(Error::LedgerTooNew {
                path: path.to_path_buf(),
                found: version,
                supported: SCHEMA_VERSION,
            });
        }

        self.conn
            .execute_batch(include_str!("schema.sql"))
            .map_err(unavailable)?;
        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)
                .map_err(unavailable)?;
        }
        debug!("Ledger schema initialized (version {})", SCHEMA_VERSION);
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Canonical `copied_at` encoding. Fixed width UTC, so `MAX()` over the
/// text column orders chronologically.
pub fn format_copied_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_copied_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
