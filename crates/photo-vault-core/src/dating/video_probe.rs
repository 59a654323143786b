use chrono::{DateTime, Local, NaiveDateTime};
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::process::Command;

pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mov", "mkv", "webm", "avi", "m4v", "3gp"];

#[derive(Debug, Default, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    creation_time: Option<String>,
}

/// Container creation time via `ffprobe -show_format`, in local time.
pub fn video_creation_date(ffprobe: &str, path: &Path) -> io::Result<Option<NaiveDateTime>> {
    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()?;
    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("ffprobe exited with {}", output.status),
        ));
    }
    parse_creation_time(&output.stdout)
}

pub fn parse_creation_time(json: &[u8]) -> io::Result<Option<NaiveDateTime>> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;
    Ok(probe
        .format
        .tags
        .creation_time
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Local).naive_local()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_creation_time() {
        let json = br#"{"format": {"filename": "clip.mov", "tags": {"creation_time": "2023-07-15T12:00:00.000000Z"}}}"#;
        let parsed = parse_creation_time(json).unwrap().unwrap();
        assert_eq!((parsed.year(), parsed.month()), (2023, 7));
    }

    #[test]
    fn test_missing_tags_is_none() {
        assert_eq!(parse_creation_time(br#"{"format": {}}"#).unwrap(), None);
        assert_eq!(parse_creation_time(br#"{}"#).unwrap(), None);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_creation_time(b"not json").is_err());
    }
}
