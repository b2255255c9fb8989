use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ProcessingError, Result};
use crate::models::{ExportRow, WeatherDay};

/// Reader for the tab-separated AquaCrop climate file
pub struct ClimateFileReader;

impl ClimateFileReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_rows(&self, path: &Path) -> Result<Vec<ExportRow>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();

        for (idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if let Some(row) = self.parse_line(&line, idx + 1)? {
                rows.push(row);
            }
        }

        Ok(rows)
    }

    /// Weather table for the simulation boundary
    pub fn read_weather(&self, path: &Path) -> Result<Vec<WeatherDay>> {
        self.read_rows(path)?
            .iter()
            .map(|row| {
                WeatherDay::from_row(row).ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!(
                        "Invalid calendar date {}/{}/{} in {}",
                        row.day,
                        row.month,
                        row.year,
                        path.display()
                    ))
                })
            })
            .collect()
    }

    /// Parse one line; the header and blank lines yield `None`
    fn parse_line(&self, line: &str, line_no: usize) -> Result<Option<ExportRow>> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.is_empty() || parts[0].eq_ignore_ascii_case("Day") {
            return Ok(None);
        }

        if parts.len() != 7 {
            return Err(ProcessingError::InvalidFormat(format!(
                "Line {}: expected 7 fields, found {}",
                line_no,
                parts.len()
            )));
        }

        let int = |text: &str| {
            text.parse::<u32>().map_err(|_| {
                ProcessingError::InvalidFormat(format!("Line {}: invalid integer '{}'", line_no, text))
            })
        };
        let float = |text: &str| {
            text.parse::<f64>().map_err(|_| {
                ProcessingError::InvalidFormat(format!("Line {}: invalid number '{}'", line_no, text))
            })
        };

        Ok(Some(ExportRow {
            day: int(parts[0])?,
            month: int(parts[1])?,
            year: int(parts[2])? as i32,
            tmin: float(parts[3])?,
            tmax: float(parts[4])?,
            precipitation: float(parts[5])?,
            reference_et: float(parts[6])?,
        }))
    }
}

impl Default for ClimateFileReader {
    fn default() -> Self {
        Self::new()
    }
}
