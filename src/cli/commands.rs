use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::args::{Cli, Commands, ConfigOverrides};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::{DailySeries, IntegrityChecker, Pipeline};
use crate::utils::filename::generate_default_parquet_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{DailyCsvWriter, ParquetWriter};

pub fn run(cli: Cli) -> Result<()> {
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Run {
            input_dir,
            output_file,
            clean_csv,
            parquet,
            parquet_file,
            compression,
            overrides,
        } => {
            let config = load_config(cli.config.as_deref(), &overrides, input_dir, output_file)?;
            println!("Processing station data...");
            println!("Input directory: {}", config.input_path.display());
            println!("Output file: {}", config.output_path.display());

            let pipeline = Pipeline::new(config)?.with_progress(show_progress);
            let series = pipeline.build_daily_series(&pipeline.config().input_path)?;
            print_series(&series);

            if let Some(path) = clean_csv {
                let rows = DailyCsvWriter::new().write(&path, &series.records)?;
                println!("Cleaned daily CSV: {} ({} days)", path.display(), rows);
            }

            if parquet || parquet_file.is_some() {
                let path = parquet_file.unwrap_or_else(|| {
                    generate_default_parquet_filename(&pipeline.config().station.name)
                });
                pipeline.write_parquet(&series.records, &path, &compression)?;
                let file_info = ParquetWriter::new().get_file_info(&path)?;
                println!("\n{}", file_info.summary());
            }

            let progress = ProgressReporter::new_spinner("Writing climate file...", !show_progress);
            let summary = pipeline.export(series.records, &pipeline.config().output_path)?;
            progress.finish_with_message(&format!("Wrote {} days", summary.rows_written));

            println!("\n{}", summary.summary());
            println!("Processing complete!");
        }

        Commands::Clean {
            input_dir,
            output_file,
            overrides,
        } => {
            let config = load_config(cli.config.as_deref(), &overrides, input_dir, None)?;
            println!("Cleaning station data from {}", config.input_path.display());

            let series = Pipeline::new(config)?
                .with_progress(show_progress)
                .clean(&output_file)?;
            print_series(&series);
            println!("Cleaned daily CSV written to {}", output_file.display());
        }

        Commands::Export {
            input,
            output_file,
            overrides,
        } => {
            let config = load_config(cli.config.as_deref(), &overrides, None, output_file)?;
            println!("Exporting {} to {}", input.display(), config.output_path.display());

            let summary = Pipeline::new(config)?.export_cleaned(&input)?;
            println!("\n{}", summary.summary());
        }

        Commands::Validate {
            input_dir,
            json,
            overrides,
        } => {
            let config = load_config(cli.config.as_deref(), &overrides, input_dir, None)?;
            let pipeline = Pipeline::new(config)?.with_progress(show_progress && !json);
            let (series, report) = pipeline.validate()?;

            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| ProcessingError::InvalidFormat(e.to_string()))?;
                println!("{}", text);
                return Ok(());
            }

            print_series(&series);
            println!("\n{}", IntegrityChecker::new().generate_summary(&report));

            if report.violations.is_empty() {
                println!("✅ All data passed validation checks");
            } else {
                println!("⚠️  Found {} validation issues", report.violations.len());
            }
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let reader = ParquetWriter::new();
            let file_info = reader.get_file_info(&file)?;
            println!("\n{}", file_info.summary());

            if sample > 0 {
                let records = reader.read_records(&file, sample)?;
                println!("\nSample Records (showing {} records):", records.len());
                for (i, record) in records.iter().enumerate() {
                    println!(
                        "{}. {}: tmin={} tmax={} precip={} rh={} wind={} rad={} et0={}{}",
                        i + 1,
                        record.date,
                        fmt_value(record.tmin),
                        fmt_value(record.tmax),
                        fmt_value(record.precipitation),
                        fmt_value(record.relative_humidity),
                        fmt_value(record.wind_speed_2m),
                        fmt_value(record.solar_radiation),
                        fmt_value(record.reference_et),
                        if record.is_reindexed() { " (reindexed)" } else { "" }
                    );
                }
            }
        }
    }

    Ok(())
}

/// File and environment first, then command-line overrides
fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
    input_dir: Option<PathBuf>,
    output_file: Option<PathBuf>,
) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(path)?;
    overrides.apply(&mut config);
    if let Some(dir) = input_dir {
        config.input_path = dir;
    }
    if let Some(file) = output_file {
        config.output_path = file;
    }
    config.check()?;

    info!(
        station = %config.station.name,
        latitude = config.station.latitude,
        altitude = config.station.altitude,
        "Configuration loaded"
    );
    Ok(config)
}

fn print_series(series: &DailySeries) {
    println!("\n{}", series.ingest.summary());
    println!("{}", series.gap_fill.summary());
    println!(
        "Daily series: {} days, {} with reference ET",
        series.records.len(),
        series.days_with_eto
    );
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}
