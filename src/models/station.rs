use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::constants::{
    DEFAULT_ALTITUDE, DEFAULT_LATITUDE, DEFAULT_STATION_NAME, PREAMBLE_ALTITUDE_TOLERANCE,
    PREAMBLE_LATITUDE_TOLERANCE,
};

/// Operator-supplied station constants used by the ET calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationMetadata {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -500.0, max = 9000.0))]
    pub altitude: f64,
}

impl StationMetadata {
    pub fn new(name: impl Into<String>, latitude: f64, altitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            altitude,
        }
    }

    pub fn latitude_radians(&self) -> f64 {
        self.latitude.to_radians()
    }
}

impl Default for StationMetadata {
    fn default() -> Self {
        Self::new(DEFAULT_STATION_NAME, DEFAULT_LATITUDE, DEFAULT_ALTITUDE)
    }
}

/// Station block found in the preamble of an INMET export.
///
/// Informational only: the configured `StationMetadata` is authoritative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationPreamble {
    pub region: Option<String>,
    pub state: Option<String>,
    pub station: Option<String>,
    pub wmo_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

impl StationPreamble {
    /// Describe every way the preamble disagrees with the configured station
    pub fn discrepancies(&self, station: &StationMetadata) -> Vec<String> {
        let mut issues = Vec::new();

        if let Some(lat) = self.latitude {
            if (lat - station.latitude).abs() > PREAMBLE_LATITUDE_TOLERANCE {
                issues.push(format!(
                    "file latitude {:.4} differs from configured {:.4}",
                    lat, station.latitude
                ));
            }
        }

        if let Some(alt) = self.altitude {
            if (alt - station.altitude).abs() > PREAMBLE_ALTITUDE_TOLERANCE {
                issues.push(format!(
                    "file altitude {:.1} m differs from configured {:.1} m",
                    alt, station.altitude
                ));
            }
        }

        issues
    }
}
