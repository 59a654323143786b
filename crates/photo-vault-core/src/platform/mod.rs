use std::env;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Modification time as float seconds since the epoch, the unit the ledger
/// stores. `None` if the platform cannot report it or it predates the epoch.
pub fn modification_secs(metadata: &Metadata) -> Option<f64> {
    metadata.modified().ok().and_then(system_time_secs)
}

pub fn system_time_secs(time: SystemTime) -> Option<f64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs_f64())
}

/// Bytes available to the current user on the volume holding `path`.
pub fn available_space(path: &Path) -> io::Result<u64> {
    fs2::available_space(path)
}

/// Locate an executable on `PATH`. Absolute or relative paths are checked as given.
pub fn find_in_path(tool: &str) -> Option<PathBuf> {
    let candidate = Path::new(tool);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(tool);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(target_os = "windows")]
        {
            let exe = dir.join(format!("{}.exe", tool));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
