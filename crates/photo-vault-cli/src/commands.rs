use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "photo-vault")]
#[command(about = "Incremental, deduplicating photo and video backup", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy new media from a source tree into month folders under the destination
    Backup(BackupArgs),
    /// Show what the destination's ledger knows
    Status(LedgerArgs),
    /// Export every ledger record as CSV
    Export {
        #[command(flatten)]
        ledger: LedgerArgs,
        /// CSV file to write
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the effective configuration as TOML
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Source directory (photos and videos to back up)
    #[arg(long, conflicts_with = "phone")]
    pub src: Option<PathBuf>,
    /// Destination root; month folders, ledger and reports go here
    #[arg(long)]
    pub dest: Option<PathBuf>,
    /// Ledger file (default: <dest>/photo-vault.db)
    #[arg(long)]
    pub db: Option<PathBuf>,
    /// HTML report path (default: <dest>/report_YYYYMMDD_HHMMSS.html)
    #[arg(long)]
    pub report: Option<PathBuf>,
    /// Walk every file instead of only those modified since the last backup
    #[arg(long)]
    pub full: bool,
    /// Mount a phone with ifuse and back up from it
    #[arg(long)]
    pub phone: bool,
    /// Ask for anything not given on the command line
    #[arg(long, short)]
    pub interactive: bool,
}

#[derive(Debug, Args)]
pub struct LedgerArgs {
    /// Destination root holding the ledger
    #[arg(long)]
    pub dest: PathBuf,
    /// Ledger file (default: <dest>/photo-vault.db)
    #[arg(long)]
    pub db: Option<PathBuf>,
}
