use crate::hasher::{ContentHash, HashSource};
use crate::scanner::WalkIssue;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Terminal state of one candidate file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Neither capture metadata nor a modification time was available.
    NoDate,
    /// The ledger already holds this content.
    Duplicate {
        content_hash: ContentHash,
        hash_source: HashSource,
    },
    /// A file already sits at the computed destination. Not copied, not
    /// recorded. `differing_content` flags a name collision.
    AlreadyAtDestination {
        destination: PathBuf,
        differing_content: bool,
        hash_source: HashSource,
    },
    Copied {
        destination: PathBuf,
        bytes: u64,
        hash_source: HashSource,
    },
    Errored {
        description: String,
    },
    /// Cancellation arrived while this file was being copied.
    Interrupted,
}

impl FileOutcome {
    pub(crate) fn errored(description: impl Into<String>) -> Self {
        FileOutcome::Errored {
            description: description.into(),
        }
    }

    fn hash_source(&self) -> Option<HashSource> {
        match self {
            FileOutcome::Duplicate { hash_source, .. }
            | FileOutcome::AlreadyAtDestination { hash_source, .. }
            | FileOutcome::Copied { hash_source, .. } => Some(*hash_source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopiedFile {
    pub origin: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateFile {
    pub origin: PathBuf,
    pub content_hash: ContentHash,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoDate,
    AlreadyAtDestination { destination: PathBuf },
    /// Same name at the destination but different bytes.
    NameCollision { destination: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub origin: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileError {
    pub origin: PathBuf,
    pub description: String,
}

/// Everything one run produced, handed to the report emitter afterwards.
#[derive(Debug, Default)]
pub struct RunResult {
    pub total_candidates: usize,
    /// Candidates that reached a terminal state before the run ended.
    pub visited: usize,
    pub copied: Vec<CopiedFile>,
    pub duplicates: Vec<DuplicateFile>,
    pub skipped: Vec<SkippedFile>,
    pub errors: Vec<FileError>,
    pub walk_issues: Vec<WalkIssue>,
    pub identity_cache_hits: usize,
    pub interrupted: bool,
    /// Newest `copied_at` in the ledger before this run started.
    pub previous_backup: Option<DateTime<Utc>>,
    /// Lower mtime bound applied to the walk, when incremental.
    pub watermark: Option<f64>,
    /// Ledger size after the run; `None` if it could not be read.
    pub cumulative_records: Option<i64>,
    /// Candidates added from earlier runs' retry list.
    pub requeued: usize,
    /// Files still queued for retry after the run.
    pub pending_retries: Option<i64>,
    pub duration: Duration,
}

impl RunResult {
    pub(crate) fn apply(&mut self, origin: PathBuf, outcome: FileOutcome) {
        if outcome.hash_source() == Some(HashSource::IdentityCache) {
            self.identity_cache_hits += 1;
        }
        if outcome != FileOutcome::Interrupted {
            self.visited += 1;
        }

        match outcome {
            FileOutcome::NoDate => self.skipped.push(SkippedFile {
                origin,
                reason: SkipReason::NoDate,
            }),
            FileOutcome::Duplicate { content_hash, .. } => {
                self.duplicates.push(DuplicateFile {
                    origin,
                    content_hash,
                })
            }
            FileOutcome::AlreadyAtDestination {
                destination,
                differing_content,
                ..
            } => {
                let reason = if differing_content {
                    SkipReason::NameCollision { destination }
                } else {
                    SkipReason::AlreadyAtDestination { destination }
                };
                self.skipped.push(SkippedFile { origin, reason });
            }
            FileOutcome::Copied {
                destination, bytes, ..
            } => self.copied.push(CopiedFile {
                origin,
                destination,
                bytes,
            }),
            FileOutcome::Errored { description } => {
                self.errors.push(FileError {
                    origin,
                    description,
                })
            }
            FileOutcome::Interrupted => self.interrupted = true,
        }
    }

    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn bytes_copied(&self) -> u64 {
        self.copied.iter().map(|c| c.bytes).sum()
    }

    pub fn skipped_without_date(&self) -> usize {
        self.count_skipped(|reason| matches!(reason, SkipReason::NoDate))
    }

    /// Includes name collisions.
    pub fn already_at_destination(&self) -> usize {
        self.count_skipped(|reason| !matches!(reason, SkipReason::NoDate))
    }

    pub fn name_collisions(&self) -> impl Iterator<Item = &SkippedFile> {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::NameCollision { .. }))
    }

    fn count_skipped(&self, predicate: impl Fn(&SkipReason) -> bool) -> usize {
        self.skipped.iter().filter(|s| predicate(&s.reason)).count()
    }

    pub fn consistency(&self) -> Consistency {
        Consistency {
            total_candidates: self.total_candidates,
            copied: self.copied_count(),
            duplicates: self.duplicate_count(),
            errors: self.error_count(),
            skipped: self.skipped.len(),
            not_reached: self.total_candidates.saturating_sub(self.visited),
        }
    }
}

/// The `copied + duplicates + errors == total` accounting check.
///
/// Skips and files an interrupted run never reached legitimately break the
/// balance; they are kept separate so a report can show whether anything is
/// left unexplained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consistency {
    pub total_candidates: usize,
    pub copied: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub skipped: usize,
    pub not_reached: usize,
}

impl Consistency {
    pub fn processed(&self) -> usize {
        self.copied + self.duplicates + self.errors
    }

    pub fn is_balanced(&self) -> bool {
        self.processed() == self.total_candidates
    }

    /// Candidates not covered by any counter. Non-zero means a bookkeeping bug.
    pub fn unexplained(&self) -> usize {
        self.total_candidates
            .saturating_sub(self.processed() + self.skipped + self.not_reached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_tallies_each_outcome() {
        let mut result = RunResult {
            total_candidates: 5,
            ..RunResult::default()
        };
        result.apply(
            PathBuf::from("/src/a.jpg"),
            FileOutcome::Copied {
                destination: PathBuf::from("/dst/2023-03/a.jpg"),
                bytes: 10,
                hash_source: HashSource::Computed,
            },
        );
        result.apply(
            PathBuf::from("/src/b.jpg"),
            FileOutcome::Duplicate {
                content_hash: ContentHash::from_hex("ab"),
                hash_source: HashSource::IdentityCache,
            },
        );
        result.apply(PathBuf::from("/src/c.jpg"), FileOutcome::errored("copy error: disk full"));
        result.apply(PathBuf::from("/src/d.jpg"), FileOutcome::NoDate);
        result.apply(
            PathBuf::from("/src/e.jpg"),
            FileOutcome::AlreadyAtDestination {
                destination: PathBuf::from("/dst/2023-03/e.jpg"),
                differing_content: true,
                hash_source: HashSource::Computed,
            },
        );

        assert_eq!(result.copied_count(), 1);
        assert_eq!(result.duplicate_count(), 1);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.skipped_without_date(), 1);
        assert_eq!(result.already_at_destination(), 1);
        assert_eq!(result.name_collisions().count(), 1);
        assert_eq!(result.identity_cache_hits, 1);
        assert_eq!(result.bytes_copied(), 10);

        let consistency = result.consistency();
        assert!(!consistency.is_balanced());
        assert_eq!(consistency.processed(), 3);
        assert_eq!(consistency.unexplained(), 0);
    }

    #[test]
    fn test_interruption_counts_unreached_files() {
        let mut result = RunResult {
            total_candidates: 3,
            ..RunResult::default()
        };
        result.apply(PathBuf::from("/src/a.jpg"), FileOutcome::errored("hash error"));
        result.apply(PathBuf::from("/src/b.jpg"), FileOutcome::Interrupted);

        assert!(result.interrupted);
        let consistency = result.consistency();
        assert_eq!(consistency.not_reached, 2);
        assert_eq!(consistency.unexplained(), 0);
        assert!(!consistency.is_balanced());
    }
}
