use chrono::NaiveDate;
use serde::Serialize;

use crate::models::DailyRecord;
use crate::utils::constants::{
    EXTREME_DAILY_RAIN_MM, MAX_PLAUSIBLE_ETO, MAX_VALID_HUMIDITY, MAX_VALID_TEMP, MIN_VALID_TEMP,
};

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub total_days: usize,
    pub observed_days: usize,
    pub reindexed_days: usize,
    pub complete_days: usize,
    pub days_with_eto: usize,
    pub calendar_gaps: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub max_daily_precipitation: Option<f64>,
    pub violations: Vec<DataViolation>,
}

impl IntegrityReport {
    pub fn count(&self, violation_type: ViolationType) -> usize {
        self.violations
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .count()
    }

    pub fn has_extreme_rainfall(&self) -> bool {
        self.count(ViolationType::ExtremeRainfall) > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataViolation {
    pub date: NaiveDate,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationType {
    MinGreaterThanMax,
    OutOfRange,
    ExtremeRainfall,
    ImplausibleEto,
    SuspiciousJump,
}

pub struct IntegrityChecker {
    temperature_jump_threshold: f64,
    extreme_rain_threshold: f64,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            temperature_jump_threshold: 20.0, // °C between consecutive days
            extreme_rain_threshold: EXTREME_DAILY_RAIN_MM,
        }
    }

    pub fn with_rain_threshold(mut self, mm: f64) -> Self {
        self.extreme_rain_threshold = mm;
        self
    }

    /// Check a daily series; problems are reported, never fatal
    pub fn check_integrity(&self, records: &[DailyRecord]) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_days: records.len(),
            observed_days: 0,
            reindexed_days: 0,
            complete_days: 0,
            days_with_eto: 0,
            calendar_gaps: 0,
            first_date: records.iter().map(|r| r.date).min(),
            last_date: records.iter().map(|r| r.date).max(),
            max_daily_precipitation: None,
            violations: Vec::new(),
        };

        for record in records {
            self.check_record(record, &mut report);

            if record.is_reindexed() {
                report.reindexed_days += 1;
            } else {
                report.observed_days += 1;
            }
            if record.has_eto_inputs() && record.precipitation.is_some() {
                report.complete_days += 1;
            }
            if record.reference_et.is_some() {
                report.days_with_eto += 1;
            }
            if let Some(p) = record.precipitation {
                report.max_daily_precipitation =
                    Some(report.max_daily_precipitation.map_or(p, |m| m.max(p)));
            }
        }

        self.check_time_series(records, &mut report);
        report
    }

    fn check_record(&self, record: &DailyRecord, report: &mut IntegrityReport) {
        let mut push = |violation_type, details: String| {
            report.violations.push(DataViolation {
                date: record.date,
                violation_type,
                details,
            });
        };

        if let (Some(min), Some(max)) = (record.tmin, record.tmax) {
            if min > max {
                push(
                    ViolationType::MinGreaterThanMax,
                    format!("tmin {:.1} > tmax {:.1}", min, max),
                );
            }
        }

        for (temp, name) in [(record.tmin, "tmin"), (record.tmax, "tmax")] {
            if let Some(t) = temp {
                if !(MIN_VALID_TEMP..=MAX_VALID_TEMP).contains(&t) {
                    push(
                        ViolationType::OutOfRange,
                        format!(
                            "{} {} is outside valid range [{}, {}]",
                            name, t, MIN_VALID_TEMP, MAX_VALID_TEMP
                        ),
                    );
                }
            }
        }

        if let Some(rh) = record.relative_humidity {
            if !(0.0..=MAX_VALID_HUMIDITY).contains(&rh) {
                push(ViolationType::OutOfRange, format!("humidity {:.1}% out of range", rh));
            }
        }

        for (value, name) in [
            (record.precipitation, "precipitation"),
            (record.wind_speed_2m, "wind speed"),
            (record.solar_radiation, "radiation"),
        ] {
            if let Some(v) = value {
                if v < 0.0 {
                    push(ViolationType::OutOfRange, format!("negative {} {}", name, v));
                }
            }
        }

        if let Some(p) = record.precipitation {
            if p > self.extreme_rain_threshold {
                push(
                    ViolationType::ExtremeRainfall,
                    format!("{:.2} mm in one day", p),
                );
            }
        }

        if let Some(eto) = record.reference_et {
            if !(0.0..=MAX_PLAUSIBLE_ETO).contains(&eto) {
                push(
                    ViolationType::ImplausibleEto,
                    format!("reference ET {:.2} mm/day", eto),
                );
            }
        }
    }

    fn check_time_series(&self, records: &[DailyRecord], report: &mut IntegrityReport) {
        for window in records.windows(2) {
            let (prev, curr) = (&window[0], &window[1]);

            if prev.date.succ_opt() != Some(curr.date) {
                report.calendar_gaps += 1;
            }

            for (a, b, name) in [(prev.tmin, curr.tmin, "tmin"), (prev.tmax, curr.tmax, "tmax")] {
                if let (Some(a), Some(b)) = (a, b) {
                    let jump = (b - a).abs();
                    if jump > self.temperature_jump_threshold {
                        report.violations.push(DataViolation {
                            date: curr.date,
                            violation_type: ViolationType::SuspiciousJump,
                            details: format!(
                                "{} jumped {:.1}°C from {} to {}",
                                name, jump, prev.date, curr.date
                            ),
                        });
                    }
                }
            }
        }
    }

    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();
        let pct = |n: usize| {
            if report.total_days == 0 {
                0.0
            } else {
                100.0 * n as f64 / report.total_days as f64
            }
        };

        summary.push_str("=== Integrity Check Report ===\n");
        if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
            summary.push_str(&format!("Period: {} to {}\n", first, last));
        }
        summary.push_str(&format!("Total Days: {}\n", report.total_days));
        summary.push_str(&format!(
            "Observed Days: {} ({:.1}%)\n",
            report.observed_days,
            pct(report.observed_days)
        ));
        summary.push_str(&format!(
            "Reindexed Days: {} ({:.1}%)\n",
            report.reindexed_days,
            pct(report.reindexed_days)
        ));
        summary.push_str(&format!(
            "Complete Days: {} ({:.1}%)\n",
            report.complete_days,
            pct(report.complete_days)
        ));
        summary.push_str(&format!("Days with ET0: {}\n", report.days_with_eto));
        summary.push_str(&format!("Calendar Gaps: {}\n", report.calendar_gaps));

        if let Some(max) = report.max_daily_precipitation {
            summary.push_str(&format!("Maximum daily rainfall: {:.2} mm\n", max));
            if max > self.extreme_rain_threshold {
                summary.push_str(
                    "ALERT: rainfall above the extreme threshold, check the source CSV for errors\n",
                );
            }
        }

        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));
        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {} {:?}: {}\n",
                    i + 1,
                    violation.date,
                    violation.violation_type,
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DaySource;

    fn day(d: u32) -> DailyRecord {
        DailyRecord::builder(NaiveDate::from_ymd_opt(2022, 1, d).unwrap())
            .temperatures(21.0, 32.0)
            .precipitation(2.0)
            .relative_humidity(70.0)
            .wind_speed_2m(1.4)
            .solar_radiation(18.0)
            .reference_et(4.3)
            .build()
    }

    #[test]
    fn test_clean_series() {
        let records = vec![day(1), day(2), day(3)];
        let checker = IntegrityChecker::new();
        let report = checker.check_integrity(&records);

        assert_eq!(report.total_days, 3);
        assert_eq!(report.complete_days, 3);
        assert_eq!(report.days_with_eto, 3);
        assert_eq!(report.calendar_gaps, 0);
        assert!(report.violations.is_empty());
        assert!(checker.generate_summary(&report).contains("Total Days: 3"));
    }

    #[test]
    fn test_violations_detected() {
        let mut inverted = day(2);
        inverted.tmin = Some(35.0);
        let mut storm = day(3);
        storm.precipitation = Some(212.4);
        let mut hot = day(5);
        hot.tmax = Some(55.0);
        hot.reference_et = Some(18.0);
        hot.source = DaySource::Reindexed;

        let records = vec![day(1), inverted, storm, hot];
        let checker = IntegrityChecker::new();
        let report = checker.check_integrity(&records);

        assert_eq!(report.count(ViolationType::MinGreaterThanMax), 1);
        assert_eq!(report.count(ViolationType::ExtremeRainfall), 1);
        assert_eq!(report.count(ViolationType::OutOfRange), 1);
        assert_eq!(report.count(ViolationType::ImplausibleEto), 1);
        assert_eq!(report.count(ViolationType::SuspiciousJump), 1);
        assert_eq!(report.calendar_gaps, 1);
        assert_eq!(report.reindexed_days, 1);
        assert!(report.has_extreme_rainfall());
        assert!(checker.generate_summary(&report).contains("ALERT"));
    }
}
