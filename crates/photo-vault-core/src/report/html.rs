use crate::engine::{RunResult, SkipReason};
use crate::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

/// Render the run (and the cumulative ledger listing) to `path`.
pub fn write_html_report(
    path: &Path,
    result: &RunResult,
    ledger_records: &[(String, String)],
) -> Result<(), Error> {
    fs::write(path, render_html(result, ledger_records))?;
    info!("HTML report written to {}", path.display());
    Ok(())
}

pub fn render_html(result: &RunResult, ledger_records: &[(String, String)]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = render_into(&mut out, result, ledger_records);
    out
}

fn render_into(
    out: &mut String,
    result: &RunResult,
    ledger_records: &[(String, String)],
) -> std::fmt::Result {
    let consistency = result.consistency();

    out.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    out.push_str("<title>photo-vault report</title></head><body>\n");
    out.push_str("<h1>photo-vault report</h1>\n");

    out.push_str("<h2>Summary</h2>\n<ul>\n");
    writeln!(out, "<li>Files found: {}</li>", result.total_candidates)?;
    writeln!(out, "<li>Files copied: {}</li>", result.copied_count())?;
    writeln!(
        out,
        "<li>Total copied size: {}</li>",
        super::format_megabytes(result.bytes_copied())
    )?;
    writeln!(out, "<li>Duplicates skipped: {}</li>", result.duplicate_count())?;
    writeln!(
        out,
        "<li>Skipped without date: {}</li>",
        result.skipped_without_date()
    )?;
    writeln!(
        out,
        "<li>Already at destination: {}</li>",
        result.already_at_destination()
    )?;
    writeln!(out, "<li>Errors: {}</li>", result.error_count())?;
    writeln!(
        out,
        "<li>Total time taken: {:.2}s</li>",
        result.duration.as_secs_f64()
    )?;
    if result.requeued > 0 {
        writeln!(out, "<li>Retried from earlier runs: {}</li>", result.requeued)?;
    }
    if let Some(pending) = result.pending_retries.filter(|&n| n > 0) {
        writeln!(
            out,
            "<li><strong>Queued for retry: {}</strong> (picked up by the next run)</li>",
            pending
        )?;
    }
    if let Some(records) = result.cumulative_records {
        writeln!(out, "<li>Cumulative files backed up: {}</li>", records)?;
    }
    if result.interrupted {
        out.push_str("<li><strong>Run was interrupted before completion</strong></li>\n");
    }
    out.push_str("</ul>\n");

    if consistency.is_balanced() {
        out.push_str("<p>Consistency check: OK</p>\n");
    } else {
        writeln!(
            out,
            "<p><strong>Consistency check: MISMATCH</strong> copied ({}) + duplicates ({}) + errors ({}) = {} of {} candidates; {} skipped, {} not reached, {} unexplained</p>",
            consistency.copied,
            consistency.duplicates,
            consistency.errors,
            consistency.processed(),
            consistency.total_candidates,
            consistency.skipped,
            consistency.not_reached,
            consistency.unexplained(),
        )?;
    }

    out.push_str("<h2>Copied Files</h2>\n<ul>\n");
    for copied in &result.copied {
        let origin = escape(&copied.origin.to_string_lossy());
        let destination = escape(&copied.destination.to_string_lossy());
        writeln!(
            out,
            "<li>{} &rarr; {}</li>",
            file_link(&origin),
            file_link(&destination)
        )?;
    }
    out.push_str("</ul>\n");

    if !result.duplicates.is_empty() {
        out.push_str("<h2>Skipped Duplicates</h2>\n<ul>\n");
        for duplicate in &result.duplicates {
            let origin = escape(&duplicate.origin.to_string_lossy());
            writeln!(
                out,
                "<li>{} <code>{}</code></li>",
                file_link(&origin),
                escape(duplicate.content_hash.as_str())
            )?;
        }
        out.push_str("</ul>\n");
    }

    let collisions: Vec<_> = result.name_collisions().collect();
    if !collisions.is_empty() {
        out.push_str("<h2>Name Collisions</h2>\n");
        out.push_str("<p>A different file already exists under the same name; not copied.</p>\n<ul>\n");
        for skipped in collisions {
            if let SkipReason::NameCollision { destination } = &skipped.reason {
                writeln!(
                    out,
                    "<li>{} vs {}</li>",
                    file_link(&escape(&skipped.origin.to_string_lossy())),
                    file_link(&escape(&destination.to_string_lossy()))
                )?;
            }
        }
        out.push_str("</ul>\n");
    }

    if !result.skipped.is_empty() {
        out.push_str("<h2>Skipped Files</h2>\n<ul>\n");
        for skipped in &result.skipped {
            let reason = match &skipped.reason {
                SkipReason::NoDate => "no date".to_string(),
                SkipReason::AlreadyAtDestination { destination } => {
                    format!("already at {}", destination.display())
                }
                SkipReason::NameCollision { destination } => {
                    format!("different file already at {}", destination.display())
                }
            };
            writeln!(
                out,
                "<li>{} ({})</li>",
                file_link(&escape(&skipped.origin.to_string_lossy())),
                escape(&reason)
            )?;
        }
        out.push_str("</ul>\n");
    }

    if !result.errors.is_empty() {
        out.push_str("<h2>Errors</h2>\n<ul>\n");
        for failure in &result.errors {
            writeln!(
                out,
                "<li>{}: {}</li>",
                escape(&failure.origin.to_string_lossy()),
                escape(&failure.description)
            )?;
        }
        out.push_str("</ul>\n");
    }

    if !result.walk_issues.is_empty() {
        out.push_str("<h2>Unreadable Paths</h2>\n<ul>\n");
        for issue in &result.walk_issues {
            writeln!(
                out,
                "<li>{}: {}</li>",
                escape(&issue.path.to_string_lossy()),
                escape(&issue.description)
            )?;
        }
        out.push_str("</ul>\n");
    }

    writeln!(out, "<h2>All Backed-up Files ({})</h2>\n<ul>", ledger_records.len())?;
    for (origin, destination) in ledger_records {
        writeln!(
            out,
            "<li>{} &rarr; {}</li>",
            escape(origin),
            file_link(&escape(destination))
        )?;
    }
    out.push_str("</ul>\n</body></html>\n");
    Ok(())
}

/// `escaped` must already be HTML-escaped.
fn file_link(escaped: &str) -> String {
    format!("<a href=\"file://{0}\">{0}</a>", escaped)
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
