use chrono::Datelike;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::{DailyRecord, ExportRow};
use crate::utils::constants::AQUACROP_HEADER;

/// Writes the tab-separated climate file read by AquaCrop
pub struct AquaCropWriter {
    min_year: Option<i32>,
}

impl AquaCropWriter {
    pub fn new() -> Self {
        Self { min_year: None }
    }

    /// Days before `year` are left out of the file
    pub fn with_min_year(mut self, year: Option<i32>) -> Self {
        self.min_year = year;
        self
    }

    /// Convert records to rows in input order. Fails on the first record
    /// that lacks a value the file needs.
    pub fn rows(&self, records: &[DailyRecord]) -> Result<Vec<ExportRow>> {
        records
            .iter()
            .filter(|r| self.min_year.map_or(true, |min| r.date.year() >= min))
            .map(ExportRow::from_daily)
            .collect()
    }

    /// Overwrite `path` with the header and one line per day. Returns the
    /// number of data lines written.
    pub fn write(&self, path: &Path, records: &[DailyRecord]) -> Result<usize> {
        let rows = self.rows(records)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let written = write_rows(BufWriter::new(file), &rows)?;

        info!(path = %path.display(), rows = written, "Climate file written");
        Ok(written)
    }

    pub fn write_to<W: Write>(&self, writer: W, records: &[DailyRecord]) -> Result<usize> {
        let rows = self.rows(records)?;
        write_rows(writer, &rows)
    }
}

impl Default for AquaCropWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_row(row: &ExportRow) -> String {
    format!(
        "{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
        row.day, row.month, row.year, row.tmin, row.tmax, row.precipitation, row.reference_et
    )
}

fn write_rows<W: Write>(mut writer: W, rows: &[ExportRow]) -> Result<usize> {
    writeln!(writer, "{}", AQUACROP_HEADER)?;
    for row in rows {
        writeln!(writer, "{}", format_row(row))?;
    }
    writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::readers::ClimateFileReader;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn record(y: i32, m: u32, d: u32, eto: Option<f64>) -> DailyRecord {
        let mut record = DailyRecord::builder(NaiveDate::from_ymd_opt(y, m, d).unwrap())
            .temperatures(20.0, 32.0)
            .precipitation(0.0)
            .build();
        record.reference_et = eto;
        record
    }

    #[test]
    fn test_reference_line() -> Result<()> {
        let mut out = Vec::new();
        let written = AquaCropWriter::new().write_to(&mut out, &[record(2022, 1, 15, Some(4.3208))])?;

        assert_eq!(written, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Day\tMonth\tYear\tTmin(C)\tTmax(C)\tPrcp(mm)\tEt0(mm)\n15\t1\t2022\t20.00\t32.00\t0.00\t4.32\n"
        );
        Ok(())
    }

    #[test]
    fn test_empty_input_writes_header_only() -> Result<()> {
        let mut out = Vec::new();
        AquaCropWriter::new().write_to(&mut out, &[])?;
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", AQUACROP_HEADER));
        Ok(())
    }

    #[test]
    fn test_undefined_value_fails() {
        let mut out = Vec::new();
        let err = AquaCropWriter::new()
            .write_to(&mut out, &[record(2022, 1, 15, None)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ComputationUndefined);
    }

    #[test]
    fn test_min_year_filter_and_overwrite() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out").join("climate.txt");
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, "stale contents that must disappear\n".repeat(10))?;

        let records = vec![
            record(2021, 12, 31, Some(4.0)),
            record(2022, 1, 1, Some(4.1)),
            record(2022, 1, 2, Some(4.2)),
        ];
        let written = AquaCropWriter::new()
            .with_min_year(Some(2022))
            .write(&path, &records)?;
        assert_eq!(written, 2);

        let rows = ClimateFileReader::new().read_rows(&path)?;
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].day, rows[0].month, rows[0].year), (1, 1, 2022));
        assert_eq!(rows[1].reference_et, 4.2);

        Ok(())
    }
}
