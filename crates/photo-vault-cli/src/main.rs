mod commands;
mod logging;
mod progress;
mod prompt;
mod summary;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context};
use chrono::Local;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{BackupArgs, Cli, Commands, LedgerArgs};
use dotenv::dotenv;
use photo_vault_core::config::{self, AppConfig};
use photo_vault_core::mount::{IfuseMount, MountGuard, MountProvider};
use photo_vault_core::report;
use photo_vault_core::{Ledger, MediaDateProvider, RunResult, SyncEngine};
use progress::CliReporter;
use tracing::{error, info, warn};

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Backup(backup)) => {
            let result = run_backup(&config, backup)?;
            if result.interrupted {
                process::exit(EXIT_INTERRUPTED);
            }
        }
        Some(Commands::Status(ledger)) => run_status(&config, &ledger)?,
        Some(Commands::Export { ledger, out }) => run_export(&config, &ledger, &out)?,
        Some(Commands::PrintConfig) => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_backup(config: &AppConfig, mut args: BackupArgs) -> anyhow::Result<RunResult> {
    if args.interactive {
        fill_interactively(config, &mut args)?;
    }
    let Some(dest) = args.dest.clone() else {
        bail!("--dest is required (or use --interactive)");
    };
    let db_path = args.db.clone().unwrap_or_else(|| config.db_path_for(&dest));

    summary::print_last_backup(Ledger::peek_latest_copy_time(&db_path));

    // Held until the run and report are done; unmounts on every exit path.
    let mount_provider = IfuseMount::new(config.mount.clone());
    let mount = if args.phone {
        Some(MountGuard::mount(&mount_provider).context("Could not mount phone")?)
    } else {
        None
    };
    let source = match (&mount, &args.src) {
        (Some(guard), _) => guard.root().to_path_buf(),
        (None, Some(src)) => src.clone(),
        (None, None) => bail!("--src is required unless --phone is given"),
    };

    let engine = SyncEngine::new(config.clone(), &source, &dest)
        .with_db_path(&db_path)
        .incremental(config.incremental && !args.full);

    let cancel = engine.cancel_token();
    let interrupt_mount = mount.is_some().then(|| mount_provider.clone());
    ctrlc::set_handler(move || {
        let mount = interrupt_mount.as_ref().map(|m| m as &dyn MountProvider);
        if handle_interrupt(&cancel, mount) {
            process::exit(EXIT_INTERRUPTED);
        }
        eprintln!("\nInterrupted, finishing up. Press Ctrl+C again to abort immediately.");
    })
    .context("Could not install Ctrl+C handler")?;

    info!(
        "Backing up {} to {}{}",
        source.display(),
        dest.display(),
        if args.full { " (full scan)" } else { "" }
    );
    let dates = MediaDateProvider::from_config(config);
    let reporter = CliReporter::new();
    let result = engine.run(&dates, &reporter)?;

    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| dest.join(report::report_file_name(Local::now())));
    let report_written = match write_report(&db_path, &report_path, &result) {
        Ok(()) => true,
        Err(err) => {
            warn!("Could not write HTML report: {:#}", err);
            false
        }
    };

    summary::print_summary(
        &result,
        &db_path,
        report_written.then_some(report_path.as_path()),
    );
    drop(mount);
    Ok(result)
}

fn write_report(db_path: &Path, report_path: &Path, result: &RunResult) -> anyhow::Result<()> {
    let ledger = Ledger::open(db_path)?;
    let records = ledger.all_records()?;
    report::write_html_report(report_path, result, &records)?;
    Ok(())
}

fn fill_interactively(config: &AppConfig, args: &mut BackupArgs) -> anyhow::Result<()> {
    if args.src.is_none() && !args.phone {
        args.phone = prompt::prompt_confirm("Back up from a phone mounted with ifuse?", Some(false))?;
        if !args.phone {
            args.src = Some(prompt::prompt_path("Source directory", None)?);
        }
    }
    if args.dest.is_none() {
        let dest = prompt::prompt_path("Destination directory", None)?;
        let db_path = args.db.clone().unwrap_or_else(|| config.db_path_for(&dest));
        summary::print_last_backup(Ledger::peek_latest_copy_time(&db_path));
        args.dest = Some(dest);
    }
    if config.incremental && !args.full {
        args.full = !prompt::prompt_confirm("Incremental backup (only new or changed files)?", Some(true))?;
    }
    Ok(())
}

fn ledger_path(config: &AppConfig, args: &LedgerArgs) -> PathBuf {
    args.db
        .clone()
        .unwrap_or_else(|| config.db_path_for(&args.dest))
}

fn run_status(config: &AppConfig, args: &LedgerArgs) -> anyhow::Result<()> {
    let db_path = ledger_path(config, args);
    if !db_path.is_file() {
        println!("{} {}", "No backup ledger at".yellow(), db_path.display());
        return Ok(());
    }
    let ledger = Ledger::open_read_only(&db_path)?;
    println!("Database:          {}", db_path.display());
    println!(
        "Files backed up:   {}",
        ledger.record_count()?.to_string().green()
    );
    summary::print_last_backup(ledger.latest_copy_time()?);
    Ok(())
}

fn run_export(config: &AppConfig, args: &LedgerArgs, out: &Path) -> anyhow::Result<()> {
    let db_path = ledger_path(config, args);
    let ledger = Ledger::open_read_only(&db_path)
        .with_context(|| format!("Could not open {}", db_path.display()))?;
    let rows = report::write_ledger_csv(&ledger, out)?;
    println!("Exported {} records to {}", rows.to_string().green(), out.display());
    Ok(())
}

/// Ctrl+C handling: the first press asks the engine to stop, the second
/// releases any mount and returns `true` so the caller can exit at once.
/// `process::exit` skips destructors, so `MountGuard` would never run.
fn handle_interrupt(cancel: &AtomicBool, mount: Option<&dyn MountProvider>) -> bool {
    if !cancel.swap(true, Ordering::Relaxed) {
        return false;
    }
    if let Some(provider) = mount {
        if let Err(e) = provider.unmount() {
            warn!("Failed to unmount before exiting: {}", e);
        }
    }
    true
}
