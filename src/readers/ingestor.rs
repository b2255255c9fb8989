use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{DuplicatePolicy, FileErrorPolicy, PipelineConfig};
use crate::error::{ProcessingError, Result};
use crate::models::{RawObservation, StationMetadata, StationPreamble};
use crate::readers::StationReader;
use crate::utils::ProgressReporter;

/// Counters collected while loading a directory of station exports
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub files_found: usize,
    pub files_read: usize,
    pub files_skipped: Vec<(PathBuf, String)>,
    pub rows_read: usize,
    pub malformed_lines: usize,
    pub duplicate_rows: usize,
    pub duplicate_timestamps: usize,
    pub fallback_decoded: Vec<PathBuf>,
}

impl IngestReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.duplicate_rows - self.duplicate_timestamps
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Files: {} found, {} read, {} skipped\n",
            self.files_found,
            self.files_read,
            self.files_skipped.len()
        );
        summary.push_str(&format!(
            "Rows: {} read, {} kept ({} duplicate rows, {} duplicate timestamps)\n",
            self.rows_read,
            self.rows_kept(),
            self.duplicate_rows,
            self.duplicate_timestamps
        ));
        summary.push_str(&format!("Malformed lines skipped: {}\n", self.malformed_lines));

        if !self.fallback_decoded.is_empty() {
            summary.push_str(&format!(
                "Decoded with fallback encoding: {}\n",
                self.fallback_decoded.len()
            ));
        }
        for (path, reason) in &self.files_skipped {
            summary.push_str(&format!("  skipped {}: {}\n", path.display(), reason));
        }

        summary
    }
}

/// Hourly observations from every file of a directory, de-duplicated and
/// sorted by timestamp
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub observations: Vec<RawObservation>,
    pub preambles: Vec<(PathBuf, StationPreamble)>,
    pub report: IngestReport,
}

pub struct Ingestor {
    reader: StationReader,
    file_extension: String,
    duplicate_policy: DuplicatePolicy,
    on_file_error: FileErrorPolicy,
    station: StationMetadata,
    quiet: bool,
}

impl Ingestor {
    pub fn new(reader: StationReader) -> Self {
        Self {
            reader,
            file_extension: "csv".to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            on_file_error: FileErrorPolicy::default(),
            station: StationMetadata::default(),
            quiet: true,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            reader: StationReader::from_config(config)?,
            file_extension: config.file_extension.clone(),
            duplicate_policy: config.duplicate_policy,
            on_file_error: config.on_file_error,
            station: config.station.clone(),
            quiet: true,
        })
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_file_error_policy(mut self, policy: FileErrorPolicy) -> Self {
        self.on_file_error = policy;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.quiet = !show;
        self
    }

    /// Load every matching file of `dir` in sorted path order
    pub fn ingest_directory(&self, dir: &Path) -> Result<Ingestion> {
        let files = list_input_files(dir, &self.file_extension)?;
        info!(dir = %dir.display(), files = files.len(), "Reading station exports");

        let mut report = IngestReport {
            files_found: files.len(),
            ..Default::default()
        };
        let mut observations = Vec::new();
        let mut preambles = Vec::new();

        let progress = ProgressReporter::new(files.len() as u64, "Reading station files", self.quiet);

        for path in &files {
            progress.set_message(&format!("Reading {}", display_name(path)));

            match self.reader.read_file(path) {
                Ok(file) => {
                    debug!(
                        path = %path.display(),
                        rows = file.observations.len(),
                        encoding = file.encoding,
                        "File read"
                    );

                    for issue in file.preamble.discrepancies(&self.station) {
                        warn!(path = %path.display(), "{}", issue);
                    }

                    if file.encoding != self.reader.primary_encoding_name() {
                        report.fallback_decoded.push(path.clone());
                    }
                    report.files_read += 1;
                    report.rows_read += file.observations.len();
                    report.malformed_lines += file.malformed_lines;
                    observations.extend(file.observations);
                    preambles.push((path.clone(), file.preamble));
                }
                Err(e) => match self.on_file_error {
                    FileErrorPolicy::Abort => return Err(e),
                    FileErrorPolicy::Skip => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                        progress.println(&format!("Skipped {}: {}", display_name(path), e));
                        report.files_skipped.push((path.clone(), e.to_string()));
                    }
                },
            }

            progress.increment(1);
        }

        progress.finish_with_message(&format!("Read {} files", report.files_read));

        let observations = deduplicate(observations, self.duplicate_policy, &mut report);

        if report.duplicate_rows > 0 || report.duplicate_timestamps > 0 {
            warn!(
                rows = report.duplicate_rows,
                timestamps = report.duplicate_timestamps,
                "Duplicates removed"
            );
        }

        Ok(Ingestion {
            observations,
            preambles,
            report,
        })
    }
}

/// Regular files of `dir` whose extension matches case-insensitively,
/// sorted by path
pub fn list_input_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(ProcessingError::NoInputFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    files.sort();
    Ok(files)
}

/// Drop repeats in concatenation order, keeping the first, then sort by
/// timestamp
pub fn deduplicate(
    observations: Vec<RawObservation>,
    policy: DuplicatePolicy,
    report: &mut IngestReport,
) -> Vec<RawObservation> {
    let mut seen_rows = HashSet::new();
    let mut seen_timestamps = HashSet::new();
    let mut kept = Vec::with_capacity(observations.len());

    for obs in observations {
        if policy != DuplicatePolicy::None && !seen_rows.insert(obs.fingerprint) {
            report.duplicate_rows += 1;
            continue;
        }
        if policy == DuplicatePolicy::ExactRowsAndTimestamps && !seen_timestamps.insert(obs.timestamp) {
            report.duplicate_timestamps += 1;
            continue;
        }
        kept.push(obs);
    }

    kept.sort_by_key(|obs| obs.timestamp);
    kept
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
