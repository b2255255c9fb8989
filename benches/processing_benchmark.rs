use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eto_processor::config::MissingPrecipitation;
use eto_processor::models::{DailyRecord, RawObservation, StationMetadata};
use eto_processor::processors::{DailyAggregator, GapFiller, IntegrityChecker, ReferenceEt};

// Hourly rows for `days` days, every fifth day missing entirely
fn create_hourly_data(days: usize) -> Vec<RawObservation> {
    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2022, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut observations = Vec::with_capacity(days * 24);

    for day in 0..days {
        if day % 5 == 4 {
            continue;
        }
        for hour in 0..24 {
            let timestamp = start + Duration::days(day as i64) + Duration::hours(hour);
            let diurnal = ((hour as f64 - 6.0) / 24.0 * std::f64::consts::TAU).sin();

            let mut obs = RawObservation::new(timestamp, (day * 24 + hour as usize) as u64);
            obs.temp_min = Some(25.0 + 5.0 * diurnal - 0.5);
            obs.temp_max = Some(25.0 + 5.0 * diurnal + 0.5);
            obs.precipitation = Some(if hour == 15 { 2.4 } else { 0.0 });
            obs.relative_humidity = Some(70.0 - 15.0 * diurnal);
            obs.wind_speed = Some(2.0);
            obs.radiation = if (6..=18).contains(&hour) {
                Some(1500.0 * diurnal.max(0.0))
            } else {
                None
            };
            observations.push(obs);
        }
    }

    observations
}

fn daily_series(days: usize) -> Vec<DailyRecord> {
    let daily = DailyAggregator::new(MissingPrecipitation::Zero).aggregate(&create_hourly_data(days));
    GapFiller::new(MissingPrecipitation::Zero).fill(daily).0
}

fn benchmark_penman_monteith(c: &mut Criterion) {
    let station = StationMetadata::default();
    let et = ReferenceEt::new(&station);

    c.bench_function("penman_monteith", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for doy in 1..=365 {
                total += et
                    .penman_monteith(20.0, 32.0, 65.0, 1.496, 18.0, black_box(doy))
                    .eto;
            }
            black_box(total)
        })
    });
}

fn benchmark_daily_aggregation(c: &mut Criterion) {
    let observations = create_hourly_data(365);
    let aggregator = DailyAggregator::new(MissingPrecipitation::Zero);

    c.bench_function("daily_aggregation", |b| {
        b.iter(|| black_box(aggregator.aggregate(&observations).len()))
    });
}

fn benchmark_integrity_checker(c: &mut Criterion) {
    let mut records = daily_series(365);
    ReferenceEt::new(&StationMetadata::default()).annotate(&mut records);
    let checker = IntegrityChecker::new();

    c.bench_function("integrity_checker", |b| {
        b.iter(|| black_box(checker.check_integrity(&records).violations.len()))
    });
}

fn benchmark_varying_data_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_series_by_size");

    for &days in &[30, 365, 1825] {
        group.bench_with_input(BenchmarkId::new("days", days), &days, |b, &days| {
            let observations = create_hourly_data(days);
            let station = StationMetadata::default();

            b.iter(|| {
                let daily = DailyAggregator::new(MissingPrecipitation::Zero).aggregate(&observations);
                let (mut records, _) = GapFiller::new(MissingPrecipitation::Zero).fill(daily);
                black_box(ReferenceEt::new(&station).annotate(&mut records))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_penman_monteith,
    benchmark_daily_aggregation,
    benchmark_integrity_checker,
    benchmark_varying_data_sizes
);
criterion_main!(benches);
