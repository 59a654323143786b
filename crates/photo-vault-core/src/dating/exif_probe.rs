use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Extensions whose containers kamadak-exif can read.
pub const EXIF_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "heic", "heif", "tif", "tiff", "png", "webp"];

/// Capture time tags, most specific first.
const TIME_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Capture date from EXIF. `Ok(None)` when the file carries EXIF but no
/// usable date.
pub fn exif_date(path: &Path) -> Result<Option<NaiveDateTime>, exif::Error> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader)?;

    for tag in TIME_TAGS {
        let Some(field) = exif.get_field(tag, In::PRIMARY) else {
            continue;
        };
        if let Value::Ascii(ref parts) = field.value {
            if let Some(date) = parts.first().and_then(|raw| parse_exif_datetime(raw)) {
                return Ok(Some(date));
            }
        }
    }
    Ok(None)
}

/// Parse the EXIF `YYYY:MM:DD HH:MM:SS` form. Zeroed or blank dates,
/// which some cameras write, yield `None`.
pub fn parse_exif_datetime(raw: &[u8]) -> Option<NaiveDateTime> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?.and_hms_opt(
        u32::from(dt.hour),
        u32::from(dt.minute),
        u32::from(dt.second),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exif_datetime() {
        let parsed = parse_exif_datetime(b"2023:07:15 10:30:05").unwrap();
        assert_eq!(parsed.to_string(), "2023-07-15 10:30:05");
    }

    #[test]
    fn test_zeroed_exif_datetime_is_none() {
        assert_eq!(parse_exif_datetime(b"0000:00:00 00:00:00"), None);
        assert_eq!(parse_exif_datetime(b"garbage"), None);
    }

    #[test]
    fn test_non_image_has_no_exif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();
        assert!(exif_date(&path).is_err());
    }
}
