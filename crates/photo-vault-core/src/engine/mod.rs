mod layout;
mod result;

pub use layout::{destination_for, month_folder};
pub use result::{
    Consistency, CopiedFile, DuplicateFile, FileError, FileOutcome, RunResult, SkipReason,
    SkippedFile,
};

use crate::config::AppConfig;
use crate::dating::DateProvider;
use crate::error::Error;
use crate::hasher::{self, ContentHash};
use crate::platform;
use crate::progress::ProgressReporter;
use crate::scanner::{self, CandidateFilter};
use crate::storage::sqlite::format_copied_at;
use crate::storage::{Ledger, NewFileRecord};
use crate::transfer;
use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Ledger growth estimate per new record in the free-space preflight.
const LEDGER_BYTES_PER_RECORD: u64 = 512;
const MIN_LEDGER_ESTIMATE: u64 = 10 * 1024 * 1024;

/// One backup run from a source tree into a month-bucketed destination.
pub struct SyncEngine {
    config: AppConfig,
    source_root: PathBuf,
    dest_root: PathBuf,
    db_path: PathBuf,
    cancel_token: Arc<AtomicBool>,
}

impl SyncEngine {
    pub fn new(config: AppConfig, source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        let dest_root = dest_root.into();
        let db_path = config.db_path_for(&dest_root);
        Self {
            config,
            source_root: source_root.into(),
            dest_root,
            db_path,
            cancel_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Override the configured incremental mode (`--full` passes `false`).
    pub fn incremental(mut self, enabled: bool) -> Self {
        self.config.incremental = enabled;
        self
    }

    /// Setting the returned flag stops the run at the next file boundary or
    /// copy block. The file in flight is discarded, never half-written.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Run the backup:
    /// 1. Open the ledger and read the watermark of the previous run
    /// 2. Walk the source for candidates (files newer than the watermark)
    /// 3. Check the destination has room for what is not yet backed up
    /// 4. Date, hash, dedup and copy each candidate, recording every copy
    ///
    /// Per-file failures end up in [`RunResult::errors`]. Only an unusable
    /// source, ledger or destination volume fails the whole run.
    pub fn run(
        &self,
        dates: &dyn DateProvider,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunResult, Error> {
        let started = Instant::now();
        if !self.source_root.is_dir() {
            return Err(Error::InvalidSource(self.source_root.clone()));
        }
        fs::create_dir_all(&self.dest_root)?;

        let ledger = Ledger::open(&self.db_path)?;
        let previous_backup = ledger.latest_copy_time()?;
        match previous_backup {
            Some(at) => info!("Previous backup: {}", at),
            None => info!("No previous backup recorded in {}", self.db_path.display()),
        }
        let watermark = if self.config.incremental {
            previous_backup.map(|at| at.timestamp_micros() as f64 / 1_000_000.0)
        } else {
            None
        };

        // Phase 1: Scan
        info!("Scanning {}...", self.source_root.display());
        reporter.on_scan_start(&self.source_root);
        let scan_start = Instant::now();
        let filter = ledger_files(&self.db_path)
            .iter()
            .fold(
                CandidateFilter::from_config(&self.config).exclude_root(&self.dest_root),
                |filter, path| filter.exclude_root(path),
            );
        let mut change_set = scanner::resolve_change_set(&self.source_root, watermark, &filter);
        let requeued = self.requeue_pending(&ledger, &filter, &mut change_set.candidates);
        let candidates = change_set.candidates;
        let total = candidates.len();
        reporter.on_scan_complete(total, scan_start.elapsed().as_secs_f64());
        debug!(
            "Scan found {} candidates ({} retried from earlier runs, {} walk issues)",
            total,
            requeued,
            change_set.walk_issues.len()
        );

        if self.config.check_free_space {
            self.check_free_space(&ledger, &candidates)?;
        }

        let mut result = RunResult {
            total_candidates: total,
            requeued,
            walk_issues: change_set.walk_issues,
            previous_backup,
            watermark,
            ..RunResult::default()
        };

        // Phase 2: Process
        reporter.on_sync_start(total);
        let sync_start = Instant::now();
        let mut reached = 0;
        for origin in &candidates {
            if self.cancel_token.load(Ordering::Relaxed) {
                info!("Cancellation requested, stopping before {}", origin.display());
                result.interrupted = true;
                break;
            }
            let outcome = self.process_file(&ledger, dates, origin);
            reached += 1;
            track_pending(&ledger, origin, &outcome);
            let stop = outcome == FileOutcome::Interrupted;
            reporter.on_file_complete(reached, total, origin);
            result.apply(origin.clone(), outcome);
            if stop {
                break;
            }
        }
        for origin in &candidates[reached..] {
            mark_pending(&ledger, origin, "not reached before interruption");
        }
        reporter.on_sync_complete(result.copied_count(), sync_start.elapsed().as_secs_f64());

        result.cumulative_records = match ledger.record_count() {
            Ok(count) => Some(count),
            Err(e) => {
                error!("Could not count ledger records: {}", e);
                None
            }
        };
        result.pending_retries = match ledger.pending_count() {
            Ok(count) => Some(count),
            Err(e) => {
                error!("Could not count pending retries: {}", e);
                None
            }
        };
        result.duration = started.elapsed();

        let consistency = result.consistency();
        if consistency.unexplained() > 0 {
            error!(
                "Consistency check failed: {} candidates unaccounted for",
                consistency.unexplained()
            );
        } else if !consistency.is_balanced() {
            warn!(
                "copied ({}) + duplicates ({}) + errors ({}) != candidates ({}); {} skipped, {} not reached",
                consistency.copied,
                consistency.duplicates,
                consistency.errors,
                consistency.total_candidates,
                consistency.skipped,
                consistency.not_reached,
            );
        }
        info!(
            "Run finished in {:.2}s: {} copied, {} duplicates, {} errors",
            result.duration.as_secs_f64(),
            result.copied_count(),
            result.duplicate_count(),
            result.error_count(),
        );
        Ok(result)
    }

    /// Add files an earlier run failed on or never reached, whatever their
    /// mtime. Entries for files that are gone or now filtered out are dropped.
    fn requeue_pending(
        &self,
        ledger: &Ledger,
        filter: &CandidateFilter,
        candidates: &mut Vec<PathBuf>,
    ) -> usize {
        let pending = match ledger.pending_paths() {
            Ok(pending) => pending,
            Err(e) => {
                error!("Could not read pending retries: {}", e);
                return 0;
            }
        };

        let mut known: HashSet<PathBuf> = candidates.iter().cloned().collect();
        let mut requeued = 0;
        for raw in pending {
            let path = PathBuf::from(&raw);
            if !path.starts_with(&self.source_root) {
                continue;
            }
            if !path.is_file() || !filter.admits(&path) {
                debug!("Dropping stale pending entry {}", raw);
                if let Err(e) = ledger.clear_pending(&raw) {
                    warn!("Could not clear pending entry {}: {}", raw, e);
                }
                continue;
            }
            if known.insert(path.clone()) {
                candidates.push(path);
                requeued += 1;
            }
        }
        requeued
    }

    /// Date → hash → dedup → destination → copy → record, for one file.
    /// Every failure is folded into the returned outcome.
    fn process_file(&self, ledger: &Ledger, dates: &dyn DateProvider, origin: &Path) -> FileOutcome {
        let Some(date) = dates.date_of(origin).effective() else {
            debug!("No date for {}, skipping", origin.display());
            return FileOutcome::NoDate;
        };

        let metadata = match fs::metadata(origin) {
            Ok(metadata) => metadata,
            Err(e) => return FileOutcome::errored(format!("stat error: {}", e)),
        };
        let size = metadata.len() as i64;
        let modification_time = platform::modification_secs(&metadata).unwrap_or_default();

        let (content_hash, hash_source) =
            match hasher::resolve_hash(ledger, origin, size, modification_time) {
                Ok(resolved) => resolved,
                Err(e) => return FileOutcome::errored(format!("hash error: {}", e)),
            };

        match ledger.has_content(content_hash.as_str()) {
            Ok(true) => {
                debug!("{} already backed up ({})", origin.display(), content_hash);
                return FileOutcome::Duplicate {
                    content_hash,
                    hash_source,
                };
            }
            Ok(false) => {}
            Err(e) => return FileOutcome::errored(format!("ledger lookup error: {}", e)),
        }

        let Some(destination) = destination_for(&self.dest_root, &date, origin) else {
            return FileOutcome::errored("path has no file name");
        };

        if destination.exists() {
            let differing_content = differs_from(&destination, size, &content_hash);
            if differing_content {
                warn!(
                    "{} differs from existing {}, not copied",
                    origin.display(),
                    destination.display()
                );
            } else {
                debug!("{} already present at {}", origin.display(), destination.display());
            }
            return FileOutcome::AlreadyAtDestination {
                destination,
                differing_content,
                hash_source,
            };
        }

        if let Some(month_dir) = destination.parent() {
            if let Err(e) = fs::create_dir_all(month_dir) {
                return FileOutcome::errored(format!(
                    "copy error: cannot create {}: {}",
                    month_dir.display(),
                    e
                ));
            }
        }
        let bytes = match transfer::copy_preserving(origin, &destination, &self.cancel_token) {
            Ok(bytes) => bytes,
            Err(Error::Cancelled) => return FileOutcome::Interrupted,
            Err(e) => return FileOutcome::errored(format!("copy error: {}", e)),
        };

        let entry = NewFileRecord {
            origin_path: origin.to_string_lossy().into_owned(),
            destination_path: destination.to_string_lossy().into_owned(),
            content_hash: content_hash.as_str().to_string(),
            size,
            modification_time,
            copied_at: format_copied_at(Utc::now()),
        };
        if let Err(e) = ledger.record(&entry) {
            error!(
                "Copied {} but could not record it: {}",
                destination.display(),
                e
            );
            return FileOutcome::errored(format!("ledger write error: {}", e));
        }

        FileOutcome::Copied {
            destination,
            bytes,
            hash_source,
        }
    }

    /// Fail fast when the destination volume cannot hold the files that are
    /// not already known duplicates, plus ledger growth.
    fn check_free_space(&self, ledger: &Ledger, candidates: &[PathBuf]) -> Result<(), Error> {
        let mut pending_bytes = 0u64;
        let mut pending_files = 0u64;
        for path in candidates {
            let Ok(metadata) = fs::metadata(path) else {
                continue;
            };
            let size = metadata.len();
            let modification_time = platform::modification_secs(&metadata).unwrap_or_default();
            // An identity-cache hit is by construction a recorded hash.
            let known = ledger
                .lookup_cached_hash(&path.to_string_lossy(), size as i64, modification_time)?
                .is_some();
            if !known {
                pending_bytes += size;
                pending_files += 1;
            }
        }

        let ledger_estimate = (pending_files * LEDGER_BYTES_PER_RECORD).max(MIN_LEDGER_ESTIMATE);
        let required = pending_bytes + ledger_estimate;
        let available = platform::available_space(&self.dest_root)?;
        debug!(
            "Free space check: {} bytes required, {} available",
            required, available
        );
        if available < required {
            return Err(Error::InsufficientSpace {
                path: self.dest_root.clone(),
                required,
                available,
            });
        }
        Ok(())
    }
}

/// The ledger file and the sidecars SQLite keeps next to it.
fn ledger_files(db_path: &Path) -> [PathBuf; 4] {
    let sidecar = |suffix: &str| {
        let mut name = db_path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    };
    [
        db_path.to_path_buf(),
        sidecar("-wal"),
        sidecar("-shm"),
        sidecar("-journal"),
    ]
}

/// Settled outcomes leave the retry list; errors and interruptions join it.
fn track_pending(ledger: &Ledger, origin: &Path, outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Errored { description } => mark_pending(ledger, origin, description),
        FileOutcome::Interrupted => mark_pending(ledger, origin, "interrupted during copy"),
        _ => {
            if let Err(e) = ledger.clear_pending(&origin.to_string_lossy()) {
                warn!("Could not clear pending entry {}: {}", origin.display(), e);
            }
        }
    }
}

fn mark_pending(ledger: &Ledger, origin: &Path, reason: &str) {
    if let Err(e) = ledger.mark_pending(&origin.to_string_lossy(), reason) {
        error!(
            "Could not queue {} for retry, a full run will be needed: {}",
            origin.display(),
            e
        );
    }
}

/// Whether the file already at `destination` holds different bytes.
/// Unreadable counts as different.
fn differs_from(destination: &Path, size: i64, content_hash: &ContentHash) -> bool {
    match fs::metadata(destination) {
        Ok(metadata) if metadata.len() as i64 != size => return true,
        Ok(_) => {}
        Err(_) => return true,
    }
    match hasher::hash_of(destination) {
        Ok(existing) => existing != *content_hash,
        Err(e) => {
            debug!("Could not hash {}: {}", destination.display(), e);
            true
        }
    }
}
