use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaySource {
    Observed,  // At least one hourly row fell on this day
    Reindexed, // Inserted to close a calendar gap
}

/// The gap-fillable measurements of a `DailyRecord`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyField {
    Tmin,
    Tmax,
    Precipitation,
    RelativeHumidity,
    WindSpeed2m,
    SolarRadiation,
}

impl DailyField {
    pub const ALL: [DailyField; 6] = [
        DailyField::Tmin,
        DailyField::Tmax,
        DailyField::Precipitation,
        DailyField::RelativeHumidity,
        DailyField::WindSpeed2m,
        DailyField::SolarRadiation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DailyField::Tmin => "tmin",
            DailyField::Tmax => "tmax",
            DailyField::Precipitation => "precip",
            DailyField::RelativeHumidity => "rh",
            DailyField::WindSpeed2m => "wind_2m",
            DailyField::SolarRadiation => "rad_mj",
        }
    }
}

/// One calendar day of aggregated station data.
///
/// Wind is already reduced to the 2 m reference height and radiation is in
/// MJ/m². All values are optional until the gap filler has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DailyRecord {
    pub date: NaiveDate,

    #[validate(range(min = -50.0, max = 50.0))]
    pub tmin: Option<f64>,

    #[validate(range(min = -50.0, max = 50.0))]
    pub tmax: Option<f64>,

    #[validate(range(min = 0.0))]
    pub precipitation: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub relative_humidity: Option<f64>,

    #[validate(range(min = 0.0))]
    pub wind_speed_2m: Option<f64>,

    #[validate(range(min = 0.0))]
    pub solar_radiation: Option<f64>,

    pub reference_et: Option<f64>,

    pub source: DaySource,
}

impl DailyRecord {
    /// A day with every measurement absent
    pub fn empty(date: NaiveDate, source: DaySource) -> Self {
        Self {
            date,
            tmin: None,
            tmax: None,
            precipitation: None,
            relative_humidity: None,
            wind_speed_2m: None,
            solar_radiation: None,
            reference_et: None,
            source,
        }
    }

    pub fn get(&self, field: DailyField) -> Option<f64> {
        match field {
            DailyField::Tmin => self.tmin,
            DailyField::Tmax => self.tmax,
            DailyField::Precipitation => self.precipitation,
            DailyField::RelativeHumidity => self.relative_humidity,
            DailyField::WindSpeed2m => self.wind_speed_2m,
            DailyField::SolarRadiation => self.solar_radiation,
        }
    }

    pub fn get_mut(&mut self, field: DailyField) -> &mut Option<f64> {
        match field {
            DailyField::Tmin => &mut self.tmin,
            DailyField::Tmax => &mut self.tmax,
            DailyField::Precipitation => &mut self.precipitation,
            DailyField::RelativeHumidity => &mut self.relative_humidity,
            DailyField::WindSpeed2m => &mut self.wind_speed_2m,
            DailyField::SolarRadiation => &mut self.solar_radiation,
        }
    }

    pub fn builder(date: NaiveDate) -> DailyRecordBuilder {
        DailyRecordBuilder::new(date)
    }

    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }

    pub fn temperature_range(&self) -> Option<f64> {
        match (self.tmin, self.tmax) {
            (Some(min), Some(max)) => Some(max - min),
            _ => None,
        }
    }

    /// All five inputs of the Penman-Monteith equation are present
    pub fn has_eto_inputs(&self) -> bool {
        self.tmin.is_some()
            && self.tmax.is_some()
            && self.relative_humidity.is_some()
            && self.wind_speed_2m.is_some()
            && self.solar_radiation.is_some()
    }

    /// Names of the ET inputs that are absent
    pub fn missing_eto_inputs(&self) -> Vec<&'static str> {
        [
            DailyField::Tmin,
            DailyField::Tmax,
            DailyField::RelativeHumidity,
            DailyField::WindSpeed2m,
            DailyField::SolarRadiation,
        ]
        .into_iter()
        .filter(|field| self.get(*field).is_none())
        .map(|field| field.name())
        .collect()
    }

    pub fn is_reindexed(&self) -> bool {
        self.source == DaySource::Reindexed
    }

    pub fn validate_relationships(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.tmin, self.tmax) {
            if min > max {
                return Err(ProcessingError::InvalidFormat(format!(
                    "tmin {} > tmax {} on {}",
                    min, max, self.date
                )));
            }
        }

        self.validate()?;
        Ok(())
    }
}

/// One row of the cleaned daily CSV; column names match its header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCsvRow {
    pub date: NaiveDate,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub precip: Option<f64>,
    pub rh: Option<f64>,
    pub wind_2m: Option<f64>,
    pub rad_mj: Option<f64>,
}

impl From<&DailyRecord> for DailyCsvRow {
    fn from(record: &DailyRecord) -> Self {
        Self {
            date: record.date,
            tmin: record.tmin,
            tmax: record.tmax,
            precip: record.precipitation,
            rh: record.relative_humidity,
            wind_2m: record.wind_speed_2m,
            rad_mj: record.solar_radiation,
        }
    }
}

impl From<DailyCsvRow> for DailyRecord {
    fn from(row: DailyCsvRow) -> Self {
        Self {
            date: row.date,
            tmin: row.tmin,
            tmax: row.tmax,
            precipitation: row.precip,
            relative_humidity: row.rh,
            wind_speed_2m: row.wind_2m,
            solar_radiation: row.rad_mj,
            reference_et: None,
            source: DaySource::Observed,
        }
    }
}

pub struct DailyRecordBuilder {
    record: DailyRecord,
}

impl DailyRecordBuilder {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            record: DailyRecord::empty(date, DaySource::Observed),
        }
    }

    pub fn temperatures(mut self, min: f64, max: f64) -> Self {
        self.record.tmin = Some(min);
        self.record.tmax = Some(max);
        self
    }

    pub fn precipitation(mut self, precip: f64) -> Self {
        self.record.precipitation = Some(precip);
        self
    }

    pub fn relative_humidity(mut self, rh: f64) -> Self {
        self.record.relative_humidity = Some(rh);
        self
    }

    pub fn wind_speed_2m(mut self, speed: f64) -> Self {
        self.record.wind_speed_2m = Some(speed);
        self
    }

    pub fn solar_radiation(mut self, rad: f64) -> Self {
        self.record.solar_radiation = Some(rad);
        self
    }

    pub fn reference_et(mut self, eto: f64) -> Self {
        self.record.reference_et = Some(eto);
        self
    }

    pub fn source(mut self, source: DaySource) -> Self {
        self.record.source = source;
        self
    }

    pub fn build(self) -> DailyRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    #[test]
    fn test_builder_and_inputs() {
        let record = DailyRecord::builder(day(15))
            .temperatures(20.0, 32.0)
            .precipitation(3.4)
            .relative_humidity(65.0)
            .wind_speed_2m(1.496)
            .solar_radiation(18.0)
            .build();

        assert!(record.has_eto_inputs());
        assert!(record.missing_eto_inputs().is_empty());
        assert_eq!(record.day_of_year(), 15);
        assert_eq!(record.temperature_range(), Some(12.0));
        assert!(record.validate_relationships().is_ok());
        assert!(!record.is_reindexed());
    }

    #[test]
    fn test_missing_inputs_listed() {
        let record = DailyRecord::builder(day(2))
            .temperatures(20.0, 30.0)
            .wind_speed_2m(1.0)
            .build();

        assert!(!record.has_eto_inputs());
        assert_eq!(record.missing_eto_inputs(), vec!["rh", "rad_mj"]);
    }

    #[test]
    fn test_inverted_temperatures_rejected() {
        let record = DailyRecord::builder(day(3)).temperatures(30.0, 20.0).build();
        assert!(record.validate_relationships().is_err());

        let record = DailyRecord::builder(day(3))
            .temperatures(20.0, 30.0)
            .relative_humidity(140.0)
            .build();
        assert!(record.validate_relationships().is_err());
    }
}
