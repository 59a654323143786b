//! Rendering a finished run for people: the HTML report, a CSV export of the
//! ledger, and the small formatting helpers the console summary shares.

mod export;
mod html;

pub use export::write_ledger_csv;
pub use html::{render_html, write_html_report};

use chrono::{DateTime, Local, Utc};

/// `report_YYYYMMDD_HHMMSS.html`, stamped with local time.
pub fn report_file_name(at: DateTime<Local>) -> String {
    format!("report_{}.html", at.format("%Y%m%d_%H%M%S"))
}

/// "3 days, 2 hours, 5 minutes ago", dropping leading zero units.
pub fn describe_elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes_total = (now - since).num_minutes().max(0);
    let days = minutes_total / (24 * 60);
    let hours = (minutes_total / 60) % 24;
    let minutes = minutes_total % 60;

    if days > 0 {
        format!("{} days, {} hours, {} minutes ago", days, hours, minutes)
    } else if hours > 0 {
        format!("{} hours, {} minutes ago", hours, minutes)
    } else if minutes > 0 {
        format!("{} minutes ago", minutes)
    } else {
        "just now".to_string()
    }
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_describe_elapsed_units() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let ago = |d: Duration| describe_elapsed(now - d, now);

        assert_eq!(ago(Duration::seconds(30)), "just now");
        assert_eq!(ago(Duration::minutes(7)), "7 minutes ago");
        assert_eq!(ago(Duration::minutes(125)), "2 hours, 5 minutes ago");
        assert_eq!(
            ago(Duration::days(3) + Duration::minutes(61)),
            "3 days, 1 hours, 1 minutes ago"
        );
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(describe_elapsed(now + Duration::hours(1), now), "just now");
    }

    #[test]
    fn test_report_file_name() {
        let at = Local.with_ymd_and_hms(2023, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(report_file_name(at), "report_20230309_070501.html");
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(3 * 1024 * 1024 / 2), "1.50 MB");
    }
}
