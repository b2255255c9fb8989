use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::models::DailyRecord;

/// Round to two decimals, ties to even
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// One line of the AquaCrop climate file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub tmin: f64,
    pub tmax: f64,
    pub precipitation: f64,
    pub reference_et: f64,
}

impl ExportRow {
    /// Requires tmin, tmax, precipitation and reference ET to be defined
    pub fn from_daily(record: &DailyRecord) -> Result<Self> {
        let undefined = |what: &str| ProcessingError::ComputationUndefined {
            date: record.date,
            reason: format!("{} is absent", what),
        };

        Ok(Self {
            day: record.date.day(),
            month: record.date.month(),
            year: record.date.year(),
            tmin: round2(record.tmin.ok_or_else(|| undefined("tmin"))?),
            tmax: round2(record.tmax.ok_or_else(|| undefined("tmax"))?),
            precipitation: round2(
                record
                    .precipitation
                    .ok_or_else(|| undefined("precipitation"))?,
            ),
            reference_et: round2(record.reference_et.ok_or_else(|| undefined("reference ET"))?),
        })
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// A parsed climate-file day, the weather input of a crop simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    pub date: NaiveDate,
    pub tmin: f64,
    pub tmax: f64,
    pub precipitation: f64,
    pub reference_et: f64,
}

impl WeatherDay {
    pub fn from_row(row: &ExportRow) -> Option<Self> {
        row.date().map(|date| Self {
            date,
            tmin: row.tmin,
            tmax: row.tmax,
            precipitation: row.precipitation,
            reference_et: row.reference_et,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.320799804041288), 4.32);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(-1.006), -1.01);
    }

    #[test]
    fn test_from_daily() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
        let record = DailyRecord::builder(date)
            .temperatures(20.004, 31.996)
            .precipitation(12.346)
            .reference_et(4.3208)
            .build();

        let row = ExportRow::from_daily(&record).unwrap();
        assert_eq!((row.day, row.month, row.year), (15, 1, 2022));
        assert_eq!(row.tmin, 20.0);
        assert_eq!(row.tmax, 32.0);
        assert_eq!(row.precipitation, 12.35);
        assert_eq!(row.reference_et, 4.32);
        assert_eq!(row.date(), Some(date));
    }

    #[test]
    fn test_undefined_eto_is_reported() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
        let record = DailyRecord::builder(date)
            .temperatures(20.0, 32.0)
            .precipitation(0.0)
            .build();

        let err = ExportRow::from_daily(&record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ComputationUndefined);
    }
}
