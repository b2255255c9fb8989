use clap::ValueEnum;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::StationMetadata;
use crate::utils::constants::{
    DEFAULT_DECIMAL_MARKER, DEFAULT_FALLBACK_ENCODING, DEFAULT_FIELD_SEPARATOR,
    DEFAULT_FILE_EXTENSION, DEFAULT_HEADER_SKIP_LINES, DEFAULT_PRIMARY_ENCODING, MISSING_SENTINEL,
};

/// Environment variables with this prefix override the config file,
/// e.g. `ETO__STATION__LATITUDE=-5.53`.
pub const ENV_PREFIX: &str = "ETO";

/// What to do with a header that is not in the INMET column table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    #[default]
    Strict,
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    None,
    ExactRows,
    #[default]
    ExactRowsAndTimestamps,
}

/// Behaviour when a whole file fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorPolicy {
    #[default]
    Abort,
    Skip,
}

/// How a day whose hourly precipitation is entirely absent is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MissingPrecipitation {
    /// Sum of nothing is zero; calendar gaps get zero rain
    #[default]
    Zero,
    /// Leave it absent and fill it like the other fields
    Interpolate,
}

/// How days whose reference ET cannot be computed reach the climate file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedEto {
    #[default]
    FillMean,
    Skip,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub station: StationMetadata,

    #[validate(range(max = 1000))]
    pub header_skip_lines: usize,

    #[validate(length(equal = 1))]
    pub field_separator: String,

    #[validate(length(equal = 1))]
    pub decimal_marker: String,

    #[validate(length(min = 1))]
    pub file_extension: String,

    pub primary_encoding: String,
    pub fallback_encoding: String,
    pub missing_sentinels: Vec<String>,
    pub header_policy: HeaderPolicy,
    pub duplicate_policy: DuplicatePolicy,
    pub on_file_error: FileErrorPolicy,
    pub missing_precipitation: MissingPrecipitation,
    pub undefined_eto: UndefinedEto,
    pub min_year: Option<i32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("Dados__inmet"),
            output_path: PathBuf::from("climate.txt"),
            station: StationMetadata::default(),
            header_skip_lines: DEFAULT_HEADER_SKIP_LINES,
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
            decimal_marker: DEFAULT_DECIMAL_MARKER.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            primary_encoding: DEFAULT_PRIMARY_ENCODING.to_string(),
            fallback_encoding: DEFAULT_FALLBACK_ENCODING.to_string(),
            missing_sentinels: vec![MISSING_SENTINEL.to_string()],
            header_policy: HeaderPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            on_file_error: FileErrorPolicy::default(),
            missing_precipitation: MissingPrecipitation::default(),
            undefined_eto: UndefinedEto::default(),
            min_year: None,
        }
    }
}

impl PipelineConfig {
    /// Layer an optional TOML file and `ETO__*` environment variables over
    /// the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Field-level validation plus the cross-field rules
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.station.validate()?;

        if !self.field_separator.is_ascii() {
            return Err(ProcessingError::Config(format!(
                "field separator '{}' must be a single ASCII character",
                self.field_separator
            )));
        }

        if self.field_separator == self.decimal_marker {
            return Err(ProcessingError::Config(format!(
                "field separator and decimal marker are both '{}'",
                self.field_separator
            )));
        }

        self.primary_encoding()?;
        self.fallback_encoding()?;
        Ok(())
    }

    pub fn field_separator_byte(&self) -> u8 {
        self.field_separator.as_bytes().first().copied().unwrap_or(b';')
    }

    pub fn decimal_char(&self) -> char {
        self.decimal_marker.chars().next().unwrap_or('.')
    }

    pub fn primary_encoding(&self) -> Result<&'static Encoding> {
        resolve_encoding(&self.primary_encoding)
    }

    pub fn fallback_encoding(&self) -> Result<&'static Encoding> {
        resolve_encoding(&self.fallback_encoding)
    }
}

fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ProcessingError::Config(format!("Unknown text encoding: '{}'", label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.check().is_ok());
        assert_eq!(config.field_separator_byte(), b';');
        assert_eq!(config.decimal_char(), ',');
        assert_eq!(config.primary_encoding().unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(config.fallback_encoding().unwrap(), encoding_rs::UTF_8);
    }

    #[test]
    fn test_rejects_bad_settings() {
        let config = PipelineConfig {
            decimal_marker: ";".to_string(),
            ..Default::default()
        };
        assert!(config.check().is_err());

        let config = PipelineConfig {
            primary_encoding: "klingon".to_string(),
            ..Default::default()
        };
        assert!(config.check().is_err());

        let config = PipelineConfig {
            field_separator: ";;".to_string(),
            ..Default::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_load_from_toml() -> Result<()> {
        let mut file = NamedTempFile::with_suffix(".toml")?;
        writeln!(
            file,
            r#"
input_path = "raw"
output_path = "out/station_climate.txt"
header_policy = "lenient"
undefined_eto = "skip"
min_year = 2022

[station]
name = "BALSAS"
latitude = -7.46
altitude = 259.0
"#
        )?;

        let config = PipelineConfig::load(Some(file.path()))?;
        assert_eq!(config.input_path, PathBuf::from("raw"));
        assert_eq!(config.station.name, "BALSAS");
        assert_eq!(config.station.latitude, -7.46);
        assert_eq!(config.header_policy, HeaderPolicy::Lenient);
        assert_eq!(config.undefined_eto, UndefinedEto::Skip);
        assert_eq!(config.min_year, Some(2022));
        assert_eq!(config.header_skip_lines, 8);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::ExactRowsAndTimestamps);

        Ok(())
    }
}
