pub mod walk;

pub use walk::{candidates, walk, CandidateFilter, WalkIssue};

use std::path::{Path, PathBuf};

/// The finite candidate list for one run, materialised up front so the
/// total is known before processing starts.
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub candidates: Vec<PathBuf>,
    pub walk_issues: Vec<WalkIssue>,
}

pub fn resolve_change_set(
    source_root: &Path,
    min_modification_time: Option<f64>,
    filter: &CandidateFilter,
) -> ChangeSet {
    let mut change_set = ChangeSet::default();
    for item in walk(source_root, min_modification_time, filter) {
        match item {
            Ok(path) => change_set.candidates.push(path),
            Err(issue) => change_set.walk_issues.push(issue),
        }
    }
    change_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use tempfile::tempdir;

    fn write_with_mtime(path: &Path, content: &str, unix_secs: i64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0)).unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_walk_is_recursive_and_skips_directories() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        write_with_mtime(&root.join("a.jpg"), "a", 1_000);
        write_with_mtime(&root.join("DCIM/100APPLE/b.mov"), "b", 1_000);
        write_with_mtime(&root.join("DCIM/101APPLE/c.heic"), "c", 1_000);

        let filter = CandidateFilter::default();
        let change_set = resolve_change_set(root, None, &filter);
        assert_eq!(names(&change_set.candidates), vec!["a.jpg", "b.mov", "c.heic"]);
        assert!(change_set.walk_issues.is_empty());
    }

    #[test]
    fn test_min_mtime_is_strictly_greater() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        write_with_mtime(&root.join("older.jpg"), "o", 1_000);
        write_with_mtime(&root.join("same.jpg"), "s", 2_000);
        write_with_mtime(&root.join("newer.jpg"), "n", 3_000);

        let filter = CandidateFilter::default();
        let found: Vec<PathBuf> = candidates(root, Some(2_000.0), &filter).collect();
        assert_eq!(names(&found), vec!["newer.jpg"]);
    }

    #[test]
    fn test_extension_filter_and_ignore_patterns() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        write_with_mtime(&root.join("keep.JPG"), "k", 1_000);
        write_with_mtime(&root.join("notes.txt"), "t", 1_000);
        write_with_mtime(&root.join(".thumbnails/thumb.jpg"), "x", 1_000);

        let config = AppConfig {
            allowed_extensions: vec![".jpg".to_string()],
            ignore_patterns: vec!["**/.thumbnails".to_string()],
            ..AppConfig::default()
        };
        let filter = CandidateFilter::from_config(&config);
        let change_set = resolve_change_set(root, None, &filter);
        assert_eq!(names(&change_set.candidates), vec!["keep.JPG"]);
    }

    #[test]
    fn test_excluded_root_is_not_walked() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        write_with_mtime(&root.join("photo.jpg"), "p", 1_000);
        write_with_mtime(&root.join("backup/2023-01/photo.jpg"), "p", 1_000);

        let filter = CandidateFilter::default().exclude_root(&root.join("backup"));
        let change_set = resolve_change_set(root, None, &filter);
        assert_eq!(change_set.candidates, vec![root.join("photo.jpg")]);
    }

    #[test]
    fn test_missing_root_is_a_walk_issue() {
        let tmp = tempdir().unwrap();
        let filter = CandidateFilter::default();
        let change_set = resolve_change_set(&tmp.path().join("unplugged"), None, &filter);
        assert!(change_set.candidates.is_empty());
        assert_eq!(change_set.walk_issues.len(), 1);
    }
}
