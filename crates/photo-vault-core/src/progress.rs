use std::path::Path;

/// Trait for reporting sync progress.
///
/// The CLI implements it with indicatif progress bars.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _source_root: &Path) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_sync_start(&self, _total_files: usize) {}
    fn on_file_complete(&self, _processed: usize, _total_files: usize, _path: &Path) {}
    fn on_sync_complete(&self, _copied: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
