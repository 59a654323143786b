mod keymap;
mod session;

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::Parser;
use colored::*;
use console::Term;
use keymap::action_for;
use photo_vault_core::{DateProvider, MediaDateProvider};
use session::{Placement, Tally};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Sort media into month folders one keypress at a time.
#[derive(Debug, Parser)]
#[command(name = "photo-vault-sort")]
#[command(about = "Hand-sort photos and videos into month folders", long_about = None)]
struct Args {
    /// Directory holding the files to sort (not searched recursively)
    source: PathBuf,
    /// Directory that receives the month folders
    target: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    let files = session::list_media(&args.source)
        .with_context(|| format!("Could not list {}", args.source.display()))?;
    if files.is_empty() {
        println!("No media files in {}", args.source.display());
        return Ok(());
    }

    let term = Term::stdout();
    let dates = MediaDateProvider::new(None);
    let mut tally = Tally::default();

    println!("{}", keymap::legend().dimmed());
    for (index, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "[{}/{}] {} {}",
            index + 1,
            files.len(),
            name.bold(),
            describe_date(dates.date_of(file).effective()).dimmed()
        );

        let key = term.read_key().context("Could not read key")?;
        let placement = match session::place(file, &args.target, action_for(&key)) {
            Ok(placement) => placement,
            Err(err) => {
                error!("Could not copy {}: {}", file.display(), err);
                println!("  {}", "copy failed, skipped".red());
                tally.skipped += 1;
                continue;
            }
        };

        match &placement {
            Placement::Copied { destination } => {
                println!("  {} {}", "copied to".green(), destination.display())
            }
            Placement::AlreadyExists { destination } => println!(
                "  {} {}",
                "already exists, not copied:".yellow(),
                destination.display()
            ),
            Placement::Skipped => println!("  skipped"),
            Placement::Unbound => println!("  {}", format!("unbound key {:?}, skipped", key).yellow()),
            Placement::Quit => {
                println!("Exiting...");
                break;
            }
        }
        tally.add(&placement);
    }

    println!(
        "{} copied, {} already there, {} skipped",
        tally.copied.to_string().green(),
        tally.already_there,
        tally.skipped
    );
    Ok(())
}

fn describe_date(date: Option<NaiveDateTime>) -> String {
    match date {
        Some(date) => format!("({})", date.format("%Y-%m-%d")),
        None => "(no date)".to_string(),
    }
}
