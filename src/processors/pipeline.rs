use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::DailyRecord;
use crate::processors::gap_filler::GapFillReport;
use crate::processors::reference_et::resolve_undefined;
use crate::processors::{DailyAggregator, GapFiller, IntegrityChecker, IntegrityReport, ReferenceEt};
use crate::readers::{DailyCsvReader, IngestReport, Ingestor};
use crate::writers::{AquaCropWriter, DailyCsvWriter, ParquetWriter};

/// Gap-free daily series with reference ET attached
#[derive(Debug, Clone)]
pub struct DailySeries {
    pub records: Vec<DailyRecord>,
    pub ingest: IngestReport,
    pub gap_fill: GapFillReport,
    pub days_with_eto: usize,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub output_path: PathBuf,
    pub rows_written: usize,
    /// Days whose ET0 was filled or dropped under the undefined-ET policy
    pub undefined_eto_days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl ExportSummary {
    pub fn summary(&self) -> String {
        let period = match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => "empty".to_string(),
        };
        format!(
            "Climate file: {}\n- Days written: {}\n- Period: {}\n- Days with undefined ET0: {}",
            self.output_path.display(),
            self.rows_written,
            period,
            self.undefined_eto_days
        )
    }
}

/// Stage orchestration for one station
pub struct Pipeline {
    config: PipelineConfig,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.check()?;
        Ok(Self {
            config,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest, aggregate, gap-fill and compute reference ET
    pub fn build_daily_series(&self, input_dir: &Path) -> Result<DailySeries> {
        let ingestion = Ingestor::from_config(&self.config)?
            .with_progress(self.show_progress)
            .ingest_directory(input_dir)?;

        if ingestion.observations.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "no hourly observations could be read from {}",
                input_dir.display()
            )));
        }

        let daily = DailyAggregator::new(self.config.missing_precipitation)
            .aggregate(&ingestion.observations);
        let (mut records, gap_fill) = GapFiller::new(self.config.missing_precipitation).fill(daily);
        let days_with_eto = ReferenceEt::new(&self.config.station).annotate(&mut records);

        info!(
            days = records.len(),
            days_with_eto,
            "Daily series ready"
        );

        Ok(DailySeries {
            records,
            ingest: ingestion.report,
            gap_fill,
            days_with_eto,
        })
    }

    /// Apply the undefined-ET policy and write the climate file
    pub fn export(&self, records: Vec<DailyRecord>, output: &Path) -> Result<ExportSummary> {
        let (records, undefined_eto_days) = resolve_undefined(records, self.config.undefined_eto)?;

        let min_year = self.config.min_year;
        let rows_written = AquaCropWriter::new()
            .with_min_year(min_year)
            .write(output, &records)?;

        let mut exported = records
            .iter()
            .map(|r| r.date)
            .filter(|d| min_year.map_or(true, |min| d.year() >= min));
        let first_date = exported.next();
        let last_date = exported.last().or(first_date);

        Ok(ExportSummary {
            output_path: output.to_path_buf(),
            rows_written,
            undefined_eto_days,
            first_date,
            last_date,
        })
    }

    /// Raw station directory to climate file in one pass
    pub fn run(&self) -> Result<(DailySeries, ExportSummary)> {
        let series = self.build_daily_series(&self.config.input_path)?;
        let summary = self.export(series.records.clone(), &self.config.output_path)?;
        Ok((series, summary))
    }

    /// Raw station directory to the cleaned daily CSV
    pub fn clean(&self, output: &Path) -> Result<DailySeries> {
        let series = self.build_daily_series(&self.config.input_path)?;
        DailyCsvWriter::new().write(output, &series.records)?;
        Ok(series)
    }

    /// Cleaned daily CSV (file or directory) to climate file. ET0 is
    /// recomputed from the cleaned inputs.
    pub fn export_cleaned(&self, cleaned: &Path) -> Result<ExportSummary> {
        let mut records = DailyCsvReader::new().read_path(cleaned)?;
        if records.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "no daily rows in {}",
                cleaned.display()
            )));
        }

        ReferenceEt::new(&self.config.station).annotate(&mut records);
        self.export(records, &self.config.output_path)
    }

    /// Integrity report over the processed series; nothing is written
    pub fn validate(&self) -> Result<(DailySeries, IntegrityReport)> {
        let series = self.build_daily_series(&self.config.input_path)?;
        let report = IntegrityChecker::new().check_integrity(&series.records);
        Ok((series, report))
    }

    pub fn write_parquet(&self, records: &[DailyRecord], path: &Path, compression: &str) -> Result<()> {
        ParquetWriter::new()
            .with_compression(compression)?
            .write_records(records, path)
    }
}
