use crate::config::AppConfig;
use crate::platform;
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Which files a walk may yield, independent of the watermark.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    ignore_patterns: Vec<Pattern>,
    extensions: Vec<String>,
    excluded_roots: Vec<PathBuf>,
}

impl CandidateFilter {
    /// Build from config. Invalid glob patterns are logged and dropped.
    pub fn from_config(config: &AppConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        CandidateFilter {
            ignore_patterns,
            extensions: config.normalized_extensions(),
            excluded_roots: Vec::new(),
        }
    }

    /// Never descend into `root` (used for a destination nested in the source).
    pub fn exclude_root(mut self, root: &Path) -> Self {
        self.excluded_roots.push(root.to_path_buf());
        if let Ok(canonical) = root.canonicalize() {
            self.excluded_roots.push(canonical);
        }
        self
    }

    /// Whether a file found outside the walk would have been yielded by it.
    pub fn admits(&self, path: &Path) -> bool {
        !self.is_ignored(path) && self.extension_allowed(path)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
            || self.excluded_roots.iter().any(|root| path.starts_with(root))
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }
}

/// A directory or entry the walk could not read. Reported, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkIssue {
    pub path: PathBuf,
    pub description: String,
}

/// Recursive walk of `source_root` in filesystem order.
///
/// With `min_modification_time`, only files modified strictly after it are
/// yielded; a file whose metadata cannot be read is left out silently.
pub fn walk<'a>(
    source_root: &Path,
    min_modification_time: Option<f64>,
    filter: &'a CandidateFilter,
) -> impl Iterator<Item = Result<PathBuf, WalkIssue>> + 'a {
    WalkDir::new(source_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |entry| entry.depth() == 0 || !filter.is_ignored(entry.path()))
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!("Error walking {}: {}", path.display(), err);
                    return Some(Err(WalkIssue {
                        path,
                        description: err.to_string(),
                    }));
                }
            };

            if !entry.file_type().is_file() || !filter.extension_allowed(entry.path()) {
                return None;
            }

            if let Some(min) = min_modification_time {
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|metadata| platform::modification_secs(&metadata));
                match modified {
                    Some(secs) if secs > min => {}
                    Some(_) => return None,
                    None => {
                        debug!("No readable mtime for {}, excluding", entry.path().display());
                        return None;
                    }
                }
            }

            Some(Ok(entry.into_path()))
        })
}

/// Lazy candidate sequence; walk issues are logged and skipped.
pub fn candidates<'a>(
    source_root: &Path,
    min_modification_time: Option<f64>,
    filter: &'a CandidateFilter,
) -> impl Iterator<Item = PathBuf> + 'a {
    walk(source_root, min_modification_time, filter).filter_map(Result::ok)
}
