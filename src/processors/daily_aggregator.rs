use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::MissingPrecipitation;
use crate::models::{DailyRecord, DaySource, RawObservation};
use crate::utils::constants::{KJ_PER_MJ, WIND_10M_TO_2M};

/// Running totals for one calendar day
#[derive(Debug, Default)]
struct DayAccumulator {
    precip_sum: f64,
    precip_count: usize,
    tmax: Option<f64>,
    tmin: Option<f64>,
    rh_sum: f64,
    rh_count: usize,
    wind_sum: f64,
    wind_count: usize,
    rad_sum: f64,
    rad_count: usize,
}

impl DayAccumulator {
    fn add(&mut self, obs: &RawObservation) {
        if let Some(p) = obs.precipitation {
            self.precip_sum += p;
            self.precip_count += 1;
        }
        if let Some(t) = obs.temp_max {
            self.tmax = Some(self.tmax.map_or(t, |m| m.max(t)));
        }
        if let Some(t) = obs.temp_min {
            self.tmin = Some(self.tmin.map_or(t, |m| m.min(t)));
        }
        if let Some(rh) = obs.relative_humidity {
            self.rh_sum += rh;
            self.rh_count += 1;
        }
        if let Some(w) = obs.wind_speed {
            self.wind_sum += w;
            self.wind_count += 1;
        }
        if let Some(r) = obs.radiation {
            self.rad_sum += r;
            self.rad_count += 1;
        }
    }

    fn finish(&self, date: NaiveDate, policy: MissingPrecipitation) -> DailyRecord {
        let mean = |sum: f64, count: usize| (count > 0).then(|| sum / count as f64);

        let precipitation = match (self.precip_count, policy) {
            (0, MissingPrecipitation::Interpolate) => None,
            _ => Some(self.precip_sum),
        };

        DailyRecord {
            date,
            tmin: self.tmin,
            tmax: self.tmax,
            precipitation,
            relative_humidity: mean(self.rh_sum, self.rh_count),
            wind_speed_2m: mean(self.wind_sum, self.wind_count).map(|w| w * WIND_10M_TO_2M),
            solar_radiation: (self.rad_count > 0).then(|| self.rad_sum / KJ_PER_MJ),
            reference_et: None,
            source: DaySource::Observed,
        }
    }
}

/// Resamples hourly observations into calendar days
pub struct DailyAggregator {
    missing_precipitation: MissingPrecipitation,
}

impl DailyAggregator {
    pub fn new(missing_precipitation: MissingPrecipitation) -> Self {
        Self {
            missing_precipitation,
        }
    }

    /// One record per day that has at least one observation, in date order.
    /// Wind is reduced to 2 m and radiation converted to MJ/m².
    pub fn aggregate(&self, observations: &[RawObservation]) -> Vec<DailyRecord> {
        let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

        for obs in observations {
            days.entry(obs.date()).or_default().add(obs);
        }

        debug!(
            observations = observations.len(),
            days = days.len(),
            "Aggregated hourly rows"
        );

        days.iter()
            .map(|(date, acc)| acc.finish(*date, self.missing_precipitation))
            .collect()
    }
}

impl Default for DailyAggregator {
    fn default() -> Self {
        Self::new(MissingPrecipitation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour(day: u32, hour: u32) -> RawObservation {
        let ts = NaiveDate::from_ymd_opt(2022, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        RawObservation::new(ts, (day * 100 + hour) as u64)
    }

    #[test]
    fn test_aggregate_reference_day() {
        let mut observations = Vec::new();
        for (h, (tmin, tmax)) in [(20.0, 24.0), (22.0, 32.0), (23.0, 30.0)].iter().enumerate() {
            let mut obs = hour(15, h as u32);
            obs.temp_min = Some(*tmin);
            obs.temp_max = Some(*tmax);
            obs.relative_humidity = Some(65.0);
            obs.wind_speed = Some(2.0);
            obs.radiation = Some(6000.0);
            obs.precipitation = Some(0.4);
            observations.push(obs);
        }

        let days = DailyAggregator::default().aggregate(&observations);
        assert_eq!(days.len(), 1);

        let day = &days[0];
        assert_eq!(day.tmin, Some(20.0));
        assert_eq!(day.tmax, Some(32.0));
        assert_eq!(day.relative_humidity, Some(65.0));
        assert!((day.wind_speed_2m.unwrap() - 1.496).abs() < 1e-12);
        assert!((day.solar_radiation.unwrap() - 18.0).abs() < 1e-12);
        assert!((day.precipitation.unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(day.source, DaySource::Observed);
    }

    #[test]
    fn test_absent_values_are_ignored() {
        let mut a = hour(2, 0);
        a.relative_humidity = Some(60.0);
        a.radiation = None;
        let mut b = hour(2, 1);
        b.relative_humidity = None;
        let mut c = hour(1, 5);
        c.precipitation = Some(3.0);

        let days = DailyAggregator::default().aggregate(&[a, b, c]);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date.to_string(), "2022-01-01");
        assert_eq!(days[0].precipitation, Some(3.0));

        let second = &days[1];
        assert_eq!(second.relative_humidity, Some(60.0));
        assert_eq!(second.solar_radiation, None);
        assert_eq!(second.tmin, None);
        assert_eq!(second.precipitation, Some(0.0));
    }

    #[test]
    fn test_missing_precipitation_policy() {
        let days = DailyAggregator::new(MissingPrecipitation::Interpolate).aggregate(&[hour(3, 0)]);
        assert_eq!(days[0].precipitation, None);
    }
}
