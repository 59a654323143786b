use crate::error::Error;
use crate::storage::Ledger;
use std::path::Path;
use tracing::info;

/// Dump every ledger record to a CSV file. Returns the number of rows.
pub fn write_ledger_csv(ledger: &Ledger, out: &Path) -> Result<usize, Error> {
    let records = ledger.records()?;
    let mut writer = csv::Writer::from_path(out)?;
    writer.write_record([
        "origin_path",
        "destination_path",
        "content_hash",
        "size",
        "modification_time",
        "copied_at",
    ])?;
    for record in &records {
        writer.write_record([
            record.origin_path.as_str(),
            record.destination_path.as_deref().unwrap_or_default(),
            record.content_hash.as_str(),
            record.size.to_string().as_str(),
            record.modification_time.to_string().as_str(),
            record.copied_at.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    info!("Exported {} ledger records to {}", records.len(), out.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewFileRecord;

    #[test]
    fn test_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::open_in_memory().unwrap();
        ledger
            .record(&NewFileRecord {
                origin_path: "/phone/DCIM/IMG_1, copy.jpg".to_string(),
                destination_path: "/backup/2023-03/IMG_1, copy.jpg".to_string(),
                content_hash: "abc123".to_string(),
                size: 12,
                modification_time: 1_678_000_000.5,
                copied_at: "2024-01-01T00:00:00.000000Z".to_string(),
            })
            .unwrap();

        let out = dir.path().join("ledger.csv");
        assert_eq!(write_ledger_csv(&ledger, &out).unwrap(), 1);

        let mut reader = csv::Reader::from_path(&out).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[2], "content_hash");
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "/phone/DCIM/IMG_1, copy.jpg");
        assert_eq!(&rows[0][4], "1678000000.5");
    }
}
