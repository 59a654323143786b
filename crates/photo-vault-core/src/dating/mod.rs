pub mod exif_probe;
pub mod video_probe;

use crate::config::AppConfig;
use crate::platform;
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// The two dates a file can offer. Either may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileDates {
    pub metadata: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

impl FileDates {
    /// Capture-metadata date, falling back to the modification date.
    pub fn effective(&self) -> Option<NaiveDateTime> {
        self.metadata.or(self.modified)
    }
}

/// Source of a file's representative date.
pub trait DateProvider {
    fn date_of(&self, path: &Path) -> FileDates;
}

/// EXIF for photos, `ffprobe` for videos, filesystem mtime as the fallback.
///
/// Probe failures are logged at debug level and read as "no date from that
/// probe"; they never abort a run.
#[derive(Debug, Clone)]
pub struct MediaDateProvider {
    ffprobe: Option<String>,
}

impl MediaDateProvider {
    pub fn new(ffprobe: Option<String>) -> Self {
        Self { ffprobe }
    }

    /// Video probing is enabled only when configured and `ffprobe` is found.
    pub fn from_config(config: &AppConfig) -> Self {
        if !config.probe_video_dates {
            return Self::new(None);
        }
        match platform::find_in_path(&config.ffprobe_path) {
            Some(_) => Self::new(Some(config.ffprobe_path.clone())),
            None => {
                warn!(
                    "'{}' not found, video files will be dated by modification time",
                    config.ffprobe_path
                );
                Self::new(None)
            }
        }
    }

    fn metadata_date(&self, path: &Path) -> Option<NaiveDateTime> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();

        if exif_probe::EXIF_EXTENSIONS.contains(&ext.as_str()) {
            return match exif_probe::exif_date(path) {
                Ok(date) => date,
                Err(e) => {
                    debug!("No EXIF date for {}: {}", path.display(), e);
                    None
                }
            };
        }

        if video_probe::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            let tool = self.ffprobe.as_deref()?;
            return match video_probe::video_creation_date(tool, path) {
                Ok(date) => date,
                Err(e) => {
                    debug!("No ffprobe date for {}: {}", path.display(), e);
                    None
                }
            };
        }

        None
    }
}

impl DateProvider for MediaDateProvider {
    fn date_of(&self, path: &Path) -> FileDates {
        FileDates {
            metadata: self.metadata_date(path),
            modified: modified_date(path),
        }
    }
}

/// Filesystem modification time in local time.
pub fn modified_date(path: &Path) -> Option<NaiveDateTime> {
    match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => Some(DateTime::<Local>::from(modified).naive_local()),
        Err(e) => {
            debug!("No modification time for {}: {}", path.display(), e);
            None
        }
    }
}
