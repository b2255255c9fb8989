use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::MissingPrecipitation;
use crate::models::{DailyField, DailyRecord, DaySource};

/// Counts of what the gap filler changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapFillReport {
    pub reindexed_days: usize,
    pub zero_filled_precipitation: usize,
    pub interpolated_values: usize,
    pub mean_filled_values: usize,
    /// Fields with no value anywhere in the series; they stay absent
    pub empty_fields: Vec<&'static str>,
}

impl GapFillReport {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Gap filling: {} days reindexed, {} precipitation gaps set to 0, {} values interpolated, {} values mean-filled\n",
            self.reindexed_days,
            self.zero_filled_precipitation,
            self.interpolated_values,
            self.mean_filled_values
        );
        if !self.empty_fields.is_empty() {
            summary.push_str(&format!(
                "Fields with no data: {}\n",
                self.empty_fields.join(", ")
            ));
        }
        summary
    }
}

/// Turns the observed days into a contiguous, gap-free daily series
pub struct GapFiller {
    missing_precipitation: MissingPrecipitation,
}

impl GapFiller {
    pub fn new(missing_precipitation: MissingPrecipitation) -> Self {
        Self {
            missing_precipitation,
        }
    }

    /// Reindex to every calendar day between the first and last record, then
    /// interpolate and finally fall back to the series mean.
    pub fn fill(&self, days: Vec<DailyRecord>) -> (Vec<DailyRecord>, GapFillReport) {
        let mut report = GapFillReport::default();
        let mut series = reindex(days, &mut report);

        if series.is_empty() {
            return (series, report);
        }

        let mut interpolated_fields = vec![
            DailyField::Tmin,
            DailyField::Tmax,
            DailyField::RelativeHumidity,
            DailyField::WindSpeed2m,
            DailyField::SolarRadiation,
        ];

        match self.missing_precipitation {
            MissingPrecipitation::Zero => {
                for day in series.iter_mut() {
                    if day.precipitation.is_none() {
                        day.precipitation = Some(0.0);
                        report.zero_filled_precipitation += 1;
                    }
                }
            }
            MissingPrecipitation::Interpolate => {
                interpolated_fields.insert(2, DailyField::Precipitation);
            }
        }

        for field in &interpolated_fields {
            report.interpolated_values += interpolate_field(&mut series, *field);
        }

        for field in DailyField::ALL {
            match fill_with_mean(&mut series, field) {
                Some(filled) => report.mean_filled_values += filled,
                None => report.empty_fields.push(field.name()),
            }
        }

        if !report.empty_fields.is_empty() {
            warn!(fields = ?report.empty_fields, "Fields without any data remain absent");
        }

        info!(
            days = series.len(),
            reindexed = report.reindexed_days,
            interpolated = report.interpolated_values,
            mean_filled = report.mean_filled_values,
            "Daily series gap-filled"
        );

        (series, report)
    }
}

impl Default for GapFiller {
    fn default() -> Self {
        Self::new(MissingPrecipitation::default())
    }
}

/// Complete contiguous calendar; inserted days carry `DaySource::Reindexed`
fn reindex(days: Vec<DailyRecord>, report: &mut GapFillReport) -> Vec<DailyRecord> {
    let by_date: BTreeMap<_, _> = days.into_iter().map(|d| (d.date, d)).collect();

    let (Some(first), Some(last)) = (
        by_date.keys().next().copied(),
        by_date.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut by_date = by_date;
    let mut series = Vec::new();
    for date in first.iter_days().take_while(|d| *d <= last) {
        match by_date.remove(&date) {
            Some(day) => series.push(day),
            None => {
                series.push(DailyRecord::empty(date, DaySource::Reindexed));
                report.reindexed_days += 1;
            }
        }
    }

    series
}

/// Linear interpolation over the day axis. Gaps after the last valid value
/// take that value; gaps before the first valid value are left absent.
/// Returns the number of values written.
fn interpolate_field(series: &mut [DailyRecord], field: DailyField) -> usize {
    let known: Vec<(usize, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.get(field).map(|v| (i, v)))
        .collect();

    let Some(&(last_idx, last_value)) = known.last() else {
        return 0;
    };

    let mut filled = 0;
    let mut next = 0;

    for i in 0..series.len() {
        if series[i].get(field).is_some() {
            continue;
        }

        while next < known.len() && known[next].0 < i {
            next += 1;
        }

        let value = if i > last_idx {
            Some(last_value)
        } else if next == 0 {
            None
        } else {
            let (x0, y0) = known[next - 1];
            let (x1, y1) = known[next];
            let slope = (y1 - y0) / (x1 - x0) as f64;
            Some(slope * (i - x0) as f64 + y0)
        };

        if let Some(v) = value {
            *series[i].get_mut(field) = Some(v);
            filled += 1;
        }
    }

    filled
}

/// Fill remaining gaps with the field's mean; `None` when the field has no
/// values at all
fn fill_with_mean(series: &mut [DailyRecord], field: DailyField) -> Option<usize> {
    let values: Vec<f64> = series.iter().filter_map(|d| d.get(field)).collect();
    if values.is_empty() {
        return None;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let mut filled = 0;
    for day in series.iter_mut() {
        let slot = day.get_mut(field);
        if slot.is_none() {
            *slot = Some(mean);
            filled += 1;
        }
    }

    Some(filled)
}
