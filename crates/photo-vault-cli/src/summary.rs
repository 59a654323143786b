use chrono::{DateTime, Utc};
use colored::*;
use photo_vault_core::report::{describe_elapsed, format_megabytes};
use photo_vault_core::RunResult;
use std::path::Path;

pub fn print_last_backup(last_backup: Option<DateTime<Utc>>) {
    match last_backup {
        Some(at) => println!(
            "{}",
            format!(
                "Last backup was {} ({})",
                describe_elapsed(at, Utc::now()),
                at.to_rfc3339()
            )
            .green()
        ),
        None => println!("{}", "No previous backup found".yellow()),
    }
}

/// Final line-item summary of a run.
pub fn print_summary(result: &RunResult, db_path: &Path, report_path: Option<&Path>) {
    let consistency = result.consistency();

    println!();
    println!("{}", "Backup summary".bold());
    println!("  Files found:               {}", result.total_candidates);
    println!(
        "  Copied this run:           {} ({})",
        result.copied_count().to_string().green(),
        format_megabytes(result.bytes_copied())
    );
    println!(
        "  Duplicates this run:       {}",
        result.duplicate_count().to_string().cyan()
    );
    println!(
        "  Errors this run:           {}",
        if result.error_count() > 0 {
            result.error_count().to_string().red()
        } else {
            result.error_count().to_string().normal()
        }
    );
    if !result.skipped.is_empty() {
        println!(
            "  Skipped:                   {} (no date: {}, already at destination: {})",
            result.skipped.len(),
            result.skipped_without_date(),
            result.already_at_destination()
        );
    }
    let collisions = result.name_collisions().count();
    if collisions > 0 {
        println!(
            "  {}",
            format!(
                "Name collisions:           {} (different file already at destination)",
                collisions
            )
            .yellow()
        );
    }
    if !result.walk_issues.is_empty() {
        println!(
            "  {}",
            format!("Unreadable paths:          {}", result.walk_issues.len()).yellow()
        );
    }
    if result.requeued > 0 {
        println!("  Retried from earlier runs: {}", result.requeued);
    }
    if let Some(pending) = result.pending_retries.filter(|&n| n > 0) {
        println!(
            "  {}",
            format!("Queued for retry:          {} (picked up by the next run)", pending).yellow()
        );
    }
    match result.cumulative_records {
        Some(records) => println!("  Cumulative copied:         {}", records),
        None => println!("  Cumulative copied:         {}", "unknown".yellow()),
    }

    if consistency.is_balanced() {
        println!("  Consistency check:         {}", "OK".green());
    } else {
        println!(
            "  Consistency check:         {}",
            format!(
                "MISMATCH: copied + duplicates + errors = {} of {} ({} skipped, {} not reached, {} unexplained)",
                consistency.processed(),
                consistency.total_candidates,
                consistency.skipped,
                consistency.not_reached,
                consistency.unexplained()
            )
            .red()
            .bold()
        );
    }
    if result.interrupted {
        println!("  {}", "Run interrupted before completion".red().bold());
    }
    println!(
        "  Total time:                {:.2}s",
        result.duration.as_secs_f64()
    );
    println!("  Database:                  {}", db_path.display());
    if let Some(path) = report_path {
        println!(
            "  {}",
            format!("HTML report:               file://{}", path.display()).cyan()
        );
    }

    for failure in &result.errors {
        println!(
            "  {} {}: {}",
            "error".red(),
            failure.origin.display(),
            failure.description
        );
    }
}
