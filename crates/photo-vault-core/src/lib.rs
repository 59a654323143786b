pub mod config;
pub mod dating;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod mount;
pub mod platform;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod storage;
pub mod transfer;

pub use config::AppConfig;
pub use dating::{DateProvider, FileDates, MediaDateProvider};
pub use engine::{FileOutcome, RunResult, SyncEngine};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use storage::Ledger;
