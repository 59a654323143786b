use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Backup ledger at {} is unavailable: {source}", path.display())]
    LedgerUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Backup ledger at {} has schema version {found}, newer than supported {supported}", path.display())]
    LedgerTooNew {
        path: PathBuf,
        found: i64,
        supported: i64,
    },

    #[error("Failed to hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source {} does not exist or is not a directory", .0.display())]
    InvalidSource(PathBuf),

    #[error(
        "Not enough free space in {}: {required} bytes required, {available} bytes available",
        path.display()
    )]
    InsufficientSpace {
        path: PathBuf,
        required: u64,
        available: u64,
    },

    #[error("Required tool '{0}' not found in PATH")]
    ToolMissing(String),

    #[error("Mount error: {0}")]
    Mount(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}
