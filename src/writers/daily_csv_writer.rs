use csv::WriterBuilder;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::{DailyCsvRow, DailyRecord};
use crate::utils::constants::DAILY_CSV_HEADER;

/// Writes the cleaned daily series as `;`-separated CSV with `.` decimals.
/// Absent values are written as empty cells.
pub struct DailyCsvWriter {
    separator: u8,
}

impl DailyCsvWriter {
    pub fn new() -> Self {
        Self { separator: b';' }
    }

    pub fn write(&self, path: &Path, records: &[DailyRecord]) -> Result<usize> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.separator)
            .has_headers(false)
            .from_path(path)?;

        // Header goes out even when the series is empty
        writer.write_record(DAILY_CSV_HEADER)?;
        for record in records {
            writer.serialize(DailyCsvRow::from(record))?;
        }
        writer.flush()?;

        info!(path = %path.display(), days = records.len(), "Cleaned daily CSV written");
        Ok(records.len())
    }
}

impl Default for DailyCsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
