//! CSV input/output for batch classification and the local append-only log.
//!
//! All file handling lives here, at the binary boundary; the batch layer
//! only ever sees the in-memory [`Table`].

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Context;

use aftercare_batch::Table;

/// Read a whole CSV file into a [`Table`], every cell as a string.
pub fn read_csv(path: &Path) -> anyhow::Result<Table> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = Table::new(columns);
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV row {}", idx + 1))?;
        table
            .push_row(record.iter().map(str::to_string).collect())
            .with_context(|| format!("CSV row {}", idx + 1))?;
    }
    Ok(table)
}

/// Write a [`Table`] out as CSV, preserving row order.
pub fn write_csv(table: &Table, path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

/// Append one label-keyed row to the local log CSV, writing the header
/// first if the file does not exist yet. Empty cells stand in for `None`.
pub fn append_log_row(
    path: &Path,
    header: &[String],
    row: &[Option<String>],
) -> anyhow::Result<()> {
    let new_file = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log {}", path.display()))?;

    let mut writer = csv::Writer::from_writer(file);
    if new_file {
        writer.write_record(header)?;
    }
    writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or_default()))?;
    writer.flush().context("flushing log row")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_round_trip_preserves_rows_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");

        let mut table = Table::new(vec!["age".into(), "fever_status".into()]);
        table.push_row(vec!["30".into(), "มีไข้".into()]).unwrap();
        table.push_row(vec!["52".into(), "".into()]).unwrap();
        write_csv(&table, &path).unwrap();

        let read_back = read_csv(&path).unwrap();
        assert_eq!(read_back.columns(), table.columns());
        assert_eq!(read_back.rows(), table.rows());
    }

    #[test]
    fn log_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let header = vec!["Timestamp".to_string(), "อายุ".to_string()];
        let row = vec![Some("2026-03-01T09:30:00Z".to_string()), None];
        append_log_row(&path, &header, &row).unwrap();
        append_log_row(&path, &header, &row).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Timestamp"));
        assert_eq!(lines[1], lines[2]);
    }
}
