use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    DuplicatePolicy, FileErrorPolicy, HeaderPolicy, MissingPrecipitation, PipelineConfig,
    UndefinedEto,
};

#[derive(Parser)]
#[command(name = "eto-processor")]
#[command(about = "INMET hourly station data to AquaCrop climate files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Only log warnings and errors")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Station CSV directory to AquaCrop climate file
    Run {
        #[arg(short, long, help = "Directory of station CSV files")]
        input_dir: Option<PathBuf>,

        #[arg(short, long, help = "Climate file to write [default: climate.txt]")]
        output_file: Option<PathBuf>,

        #[arg(long, help = "Also write the cleaned daily CSV here")]
        clean_csv: Option<PathBuf>,

        #[arg(long, help = "Also write the daily series as Parquet")]
        parquet: bool,

        #[arg(
            long,
            help = "Parquet file path [default: output/{station}-daily-{YYMMDD}.parquet]"
        )]
        parquet_file: Option<PathBuf>,

        #[arg(long, default_value = "snappy")]
        compression: String,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Station CSV directory to the cleaned daily CSV
    Clean {
        #[arg(short, long, help = "Directory of station CSV files")]
        input_dir: Option<PathBuf>,

        #[arg(short, long, default_value = "dados_limpos.csv")]
        output_file: PathBuf,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Cleaned daily CSV (file or directory) to AquaCrop climate file
    Export {
        #[arg(short, long, help = "Cleaned daily CSV file or directory")]
        input: PathBuf,

        #[arg(short, long, help = "Climate file to write [default: climate.txt]")]
        output_file: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Check station data without writing anything
    Validate {
        #[arg(short, long, help = "Directory of station CSV files")]
        input_dir: Option<PathBuf>,

        #[arg(long, help = "Print the integrity report as JSON")]
        json: bool,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// Display information about a daily Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}

/// Command-line values that win over the config file and environment
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigOverrides {
    #[arg(long)]
    pub station_name: Option<String>,

    #[arg(long, allow_hyphen_values = true, help = "Station latitude, decimal degrees")]
    pub latitude: Option<f64>,

    #[arg(long, allow_hyphen_values = true, help = "Station altitude, metres")]
    pub altitude: Option<f64>,

    #[arg(long, help = "Leave out days before this year")]
    pub min_year: Option<i32>,

    #[arg(long, value_enum)]
    pub header_policy: Option<HeaderPolicy>,

    #[arg(long, value_enum)]
    pub duplicates: Option<DuplicatePolicy>,

    #[arg(long, value_enum)]
    pub on_file_error: Option<FileErrorPolicy>,

    #[arg(long, value_enum)]
    pub missing_precipitation: Option<MissingPrecipitation>,

    #[arg(long, value_enum)]
    pub undefined_eto: Option<UndefinedEto>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(name) = &self.station_name {
            config.station.name = name.clone();
        }
        if let Some(latitude) = self.latitude {
            config.station.latitude = latitude;
        }
        if let Some(altitude) = self.altitude {
            config.station.altitude = altitude;
        }
        if self.min_year.is_some() {
            config.min_year = self.min_year;
        }
        if let Some(policy) = self.header_policy {
            config.header_policy = policy;
        }
        if let Some(policy) = self.duplicates {
            config.duplicate_policy = policy;
        }
        if let Some(policy) = self.on_file_error {
            config.on_file_error = policy;
        }
        if let Some(policy) = self.missing_precipitation {
            config.missing_precipitation = policy;
        }
        if let Some(policy) = self.undefined_eto {
            config.undefined_eto = policy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "eto-processor",
            "run",
            "--latitude",
            "-3.1",
            "--min-year",
            "2022",
            "--undefined-eto",
            "skip",
            "--on-file-error",
            "skip",
        ]);

        let Commands::Run { overrides, .. } = cli.command else {
            panic!("expected run");
        };

        let mut config = PipelineConfig::default();
        overrides.apply(&mut config);
        assert_eq!(config.station.latitude, -3.1);
        assert_eq!(config.min_year, Some(2022));
        assert_eq!(config.undefined_eto, UndefinedEto::Skip);
        assert_eq!(config.on_file_error, FileErrorPolicy::Skip);
        assert_eq!(config.header_policy, HeaderPolicy::Strict);
    }
}
