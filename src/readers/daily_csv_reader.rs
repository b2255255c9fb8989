use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::{DailyCsvRow, DailyRecord};
use crate::readers::ingestor::list_input_files;
use crate::utils::constants::DAILY_CSV_HEADER;

/// Reads the cleaned daily CSV written by `DailyCsvWriter`
pub struct DailyCsvReader {
    separator: u8,
    file_extension: String,
}

impl DailyCsvReader {
    pub fn new() -> Self {
        Self {
            separator: b';',
            file_extension: "csv".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.file_extension = extension.to_string();
        self
    }

    pub fn read_file(&self, path: &Path) -> Result<Vec<DailyRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.separator)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?;
        for column in DAILY_CSV_HEADER {
            if !headers.iter().any(|h| h == column) {
                return Err(ProcessingError::MissingRequiredColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }

        let mut records = Vec::new();
        for row in reader.deserialize::<DailyCsvRow>() {
            records.push(DailyRecord::from(row?));
        }

        debug!(path = %path.display(), days = records.len(), "Daily CSV read");
        Ok(records)
    }

    /// Concatenate every cleaned file in `dir`, sort by date and keep the
    /// first row seen for each date
    pub fn read_directory(&self, dir: &Path) -> Result<Vec<DailyRecord>> {
        let files = list_input_files(dir, &self.file_extension)?;

        let mut records = Vec::new();
        for path in &files {
            info!(path = %path.display(), "Reading cleaned daily file");
            records.extend(self.read_file(path)?);
        }

        Ok(merge_by_date(records))
    }

    /// Accept either a single cleaned file or a directory of them
    pub fn read_path(&self, path: &Path) -> Result<Vec<DailyRecord>> {
        if path.is_dir() {
            self.read_directory(path)
        } else {
            Ok(merge_by_date(self.read_file(path)?))
        }
    }
}

impl Default for DailyCsvReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable sort by date, first occurrence wins
pub fn merge_by_date(mut records: Vec<DailyRecord>) -> Vec<DailyRecord> {
    records.sort_by_key(|r| r.date);

    let mut seen = HashSet::new();
    records.retain(|r| seen.insert(r.date));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_file_with_absent_values() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("clean.csv");
        fs::write(
            &path,
            "date;tmin;tmax;precip;rh;wind_2m;rad_mj\n\
             2022-01-01;21.5;31.2;0.0;72.1;1.2;17.9\n\
             2022-01-02;;30.8;4.2;;1.1;\n",
        )?;

        let records = DailyCsvReader::new().read_file(&path)?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tmin, Some(21.5));
        assert_eq!(records[0].solar_radiation, Some(17.9));
        assert_eq!(records[1].tmin, None);
        assert_eq!(records[1].relative_humidity, None);
        assert_eq!(records[1].precipitation, Some(4.2));

        Ok(())
    }

    #[test]
    fn test_missing_column_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("clean.csv");
        fs::write(&path, "date;tmin;tmax\n2022-01-01;21.5;31.2\n")?;

        let err = DailyCsvReader::new().read_file(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MissingRequiredColumn);

        Ok(())
    }

    #[test]
    fn test_directory_overlap_keeps_first() -> Result<()> {
        let dir = TempDir::new()?;
        let header = "date;tmin;tmax;precip;rh;wind_2m;rad_mj\n";
        fs::write(
            dir.path().join("2023.csv"),
            format!("{}2023-01-01;20;30;0;70;1;18\n2022-12-31;19;29;9;70;1;18\n", header),
        )?;
        fs::write(
            dir.path().join("2022.csv"),
            format!("{}2022-12-30;18;28;0;70;1;18\n2022-12-31;19;29;1;70;1;18\n", header),
        )?;

        let records = DailyCsvReader::new().read_directory(dir.path())?;
        let dates: Vec<String> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2022-12-30", "2022-12-31", "2023-01-01"]);
        // 2022.csv sorts first, so its row for the overlapping day wins
        assert_eq!(records[1].precipitation, Some(1.0));

        Ok(())
    }
}
