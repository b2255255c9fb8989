use std::f64::consts::PI;
use tracing::{debug, warn};

use crate::config::UndefinedEto;
use crate::error::{ProcessingError, Result};
use crate::models::{DailyRecord, StationMetadata};

/// FAO-56 Penman-Monteith reference evapotranspiration for one station.
///
/// Latitude and altitude are fixed per station, so the latitude in radians
/// and the psychrometric constant are computed once.
#[derive(Debug, Clone)]
pub struct ReferenceEt {
    latitude_rad: f64,
    pressure: f64,
    gamma: f64,
}

/// Intermediate terms of one evaluation, exposed for inspection and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EtComponents {
    pub saturation_vapour_pressure: f64,
    pub actual_vapour_pressure: f64,
    pub delta: f64,
    pub gamma: f64,
    pub extraterrestrial_radiation: f64,
    pub net_radiation: f64,
    pub eto: f64,
}

impl ReferenceEt {
    pub fn new(station: &StationMetadata) -> Self {
        let pressure = 101.3 * ((293.0 - 0.0065 * station.altitude) / 293.0).powf(5.26);
        Self {
            latitude_rad: station.latitude_radians(),
            pressure,
            gamma: 0.000665 * pressure,
        }
    }

    /// Atmospheric pressure at the station altitude (kPa)
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// ET0 in mm/day, `None` if any of the five inputs is absent or the
    /// equation has no finite value for the day
    pub fn compute(&self, record: &DailyRecord) -> Option<f64> {
        self.components(record).map(|c| c.eto)
    }

    pub fn try_compute(&self, record: &DailyRecord) -> Result<f64> {
        self.compute(record)
            .ok_or_else(|| ProcessingError::ComputationUndefined {
                date: record.date,
                reason: undefined_reason(record),
            })
    }

    pub fn components(&self, record: &DailyRecord) -> Option<EtComponents> {
        let components = self.penman_monteith(
            record.tmin?,
            record.tmax?,
            record.relative_humidity?,
            record.wind_speed_2m?,
            record.solar_radiation?,
            record.day_of_year(),
        );
        components.eto.is_finite().then_some(components)
    }

    /// Extraterrestrial radiation Ra (MJ/m²/day) for a day of the year
    pub fn extraterrestrial_radiation(&self, doy: u32) -> f64 {
        let angle = 2.0 * PI * doy as f64 / 365.0;
        let dr = 1.0 + 0.033 * angle.cos();
        let decl = 0.409 * (angle - 1.39).sin();
        let lat = self.latitude_rad;
        let ws = (-lat.tan() * decl.tan()).clamp(-1.0, 1.0).acos();

        (24.0 * 60.0 / PI)
            * 0.0820
            * dr
            * (ws * lat.sin() * decl.sin() + lat.cos() * decl.cos() * ws.sin())
    }

    pub fn penman_monteith(
        &self,
        tmin: f64,
        tmax: f64,
        rh: f64,
        u2: f64,
        rs: f64,
        doy: u32,
    ) -> EtComponents {
        let tmean = (tmin + tmax) / 2.0;

        let es = (saturation_vapour_pressure(tmin) + saturation_vapour_pressure(tmax)) / 2.0;
        let ea = (rh / 100.0) * es;
        let delta = 4098.0 * saturation_vapour_pressure(tmean) / (tmean + 237.3).powf(2.0);

        let ra = self.extraterrestrial_radiation(doy);
        let rns = (1.0 - 0.23) * rs;
        // No clear-sky radiation in polar night; the result is NaN
        let cloudiness = if ra > 0.0 {
            1.35 * (rs / (0.75 * ra)) - 0.35
        } else {
            f64::NAN
        };
        let rnl = 4.903e-9
            * (((tmax + 273.16).powf(4.0) + (tmin + 273.16).powf(4.0)) / 2.0)
            * (0.34 - 0.14 * ea.sqrt())
            * cloudiness;
        let rn = rns - rnl;
        let g = 0.0;

        let numerator =
            0.408 * delta * (rn - g) + self.gamma * (900.0 / (tmean + 273.0)) * u2 * (es - ea);
        let denominator = delta + self.gamma * (1.0 + 0.34 * u2);

        let eto = if denominator != 0.0 {
            numerator / denominator
        } else {
            0.0
        };

        EtComponents {
            saturation_vapour_pressure: es,
            actual_vapour_pressure: ea,
            delta,
            gamma: self.gamma,
            extraterrestrial_radiation: ra,
            net_radiation: rn,
            eto,
        }
    }

    /// Attach ET0 to every record; returns how many were defined
    pub fn annotate(&self, records: &mut [DailyRecord]) -> usize {
        let mut defined = 0;
        for record in records.iter_mut() {
            record.reference_et = self.compute(record);
            if record.reference_et.is_some() {
                defined += 1;
            }
        }

        debug!(defined, total = records.len(), "Reference ET computed");
        defined
    }
}

/// Saturation vapour pressure (kPa) at a temperature in °C
pub fn saturation_vapour_pressure(t: f64) -> f64 {
    0.6108 * ((17.27 * t) / (t + 237.3)).exp()
}

fn undefined_reason(record: &DailyRecord) -> String {
    let missing = record.missing_eto_inputs();
    if missing.is_empty() {
        "no extraterrestrial radiation on this day".to_string()
    } else {
        format!("missing {}", missing.join(", "))
    }
}

/// Apply the undefined-ET policy before export. Returns the records to
/// export and the number of days that were filled or dropped.
pub fn resolve_undefined(
    mut records: Vec<DailyRecord>,
    policy: UndefinedEto,
) -> Result<(Vec<DailyRecord>, usize)> {
    let undefined = records.iter().filter(|r| r.reference_et.is_none()).count();
    if undefined == 0 {
        return Ok((records, 0));
    }

    match policy {
        UndefinedEto::Fail => {
            let first = records.iter().find(|r| r.reference_et.is_none());
            match first {
                Some(record) => Err(ProcessingError::ComputationUndefined {
                    date: record.date,
                    reason: undefined_reason(record),
                }),
                None => Ok((records, 0)),
            }
        }
        UndefinedEto::Skip => {
            warn!(days = undefined, "Dropping days without reference ET");
            records.retain(|r| r.reference_et.is_some());
            Ok((records, undefined))
        }
        UndefinedEto::FillMean => {
            let defined: Vec<f64> = records.iter().filter_map(|r| r.reference_et).collect();
            let Some(first) = records.iter().find(|r| r.reference_et.is_none()) else {
                return Ok((records, 0));
            };
            if defined.is_empty() {
                return Err(ProcessingError::ComputationUndefined {
                    date: first.date,
                    reason: "no day of the series has a defined reference ET".to_string(),
                });
            }

            let mean = defined.iter().sum::<f64>() / defined.len() as f64;
            warn!(days = undefined, mean, "Filling undefined reference ET with the series mean");
            for record in records.iter_mut().filter(|r| r.reference_et.is_none()) {
                record.reference_et = Some(mean);
            }
            Ok((records, undefined))
        }
    }
}
