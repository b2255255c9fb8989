pub mod climate_file_reader;
pub mod daily_csv_reader;
pub mod ingestor;
pub mod station_reader;

pub use climate_file_reader::ClimateFileReader;
pub use daily_csv_reader::DailyCsvReader;
pub use ingestor::{IngestReport, Ingestion, Ingestor};
pub use station_reader::{StationFile, StationReader};
