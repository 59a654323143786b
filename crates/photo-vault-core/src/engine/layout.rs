use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// `YYYY-MM` bucket for a date.
pub fn month_folder(date: &NaiveDateTime) -> String {
    date.format("%Y-%m").to_string()
}

/// `<dest_root>/<YYYY-MM>/<original file name>`; `None` if `origin` has no
/// file name.
pub fn destination_for(dest_root: &Path, date: &NaiveDateTime, origin: &Path) -> Option<PathBuf> {
    let file_name = origin.file_name()?;
    Some(dest_root.join(month_folder(date)).join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(23, 59, 59).unwrap()
    }

    #[test]
    fn test_month_folder_is_zero_padded() {
        assert_eq!(month_folder(&at(2023, 7, 15)), "2023-07");
        assert_eq!(month_folder(&at(1999, 12, 31)), "1999-12");
    }

    #[test]
    fn test_destination_keeps_original_name() {
        let dest = destination_for(
            Path::new("/backup"),
            &at(2023, 7, 15),
            Path::new("/phone/DCIM/100APPLE/IMG_0001.HEIC"),
        )
        .unwrap();
        assert_eq!(dest, PathBuf::from("/backup/2023-07/IMG_0001.HEIC"));
    }

    #[test]
    fn test_destination_requires_file_name() {
        assert!(destination_for(Path::new("/backup"), &at(2023, 7, 15), Path::new("/")).is_none());
    }
}
