use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Coarse classification of failures, stable enough to match on in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoInputFiles,
    FileDecodeFailure,
    MissingRequiredColumn,
    ComputationUndefined,
    Other,
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("No '*.{extension}' station files found in {}", dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },

    #[error("Could not decode {} as {primary} ({primary_cause}) or {fallback} ({fallback_cause})", path.display())]
    FileDecodeFailure {
        path: PathBuf,
        primary: String,
        primary_cause: String,
        fallback: String,
        fallback_cause: String,
    },

    #[error("Required column '{column}' not found in {}", path.display())]
    MissingRequiredColumn { path: PathBuf, column: String },

    #[error("Unknown column header: '{0}'")]
    UnknownColumn(String),

    #[error("Reference ET undefined on {date}: {reason}")]
    ComputationUndefined { date: NaiveDate, reason: String },

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Simulation error: {0}")]
    Simulation(String),
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::NoInputFiles { .. } => ErrorKind::NoInputFiles,
            ProcessingError::FileDecodeFailure { .. } => ErrorKind::FileDecodeFailure,
            ProcessingError::MissingRequiredColumn { .. } => ErrorKind::MissingRequiredColumn,
            ProcessingError::ComputationUndefined { .. } => ErrorKind::ComputationUndefined,
            _ => ErrorKind::Other,
        }
    }
}
