/// AquaCrop climate file header, written verbatim
pub const AQUACROP_HEADER: &str = "Day\tMonth\tYear\tTmin(C)\tTmax(C)\tPrcp(mm)\tEt0(mm)";

/// Cleaned daily CSV header
pub const DAILY_CSV_HEADER: [&str; 7] = ["date", "tmin", "tmax", "precip", "rh", "wind_2m", "rad_mj"];

/// INMET export layout
pub const DEFAULT_HEADER_SKIP_LINES: usize = 8;
pub const DEFAULT_FIELD_SEPARATOR: &str = ";";
pub const DEFAULT_DECIMAL_MARKER: &str = ",";
pub const DEFAULT_FILE_EXTENSION: &str = "csv";
pub const DEFAULT_PRIMARY_ENCODING: &str = "latin1";
pub const DEFAULT_FALLBACK_ENCODING: &str = "utf-8";
pub const MISSING_SENTINEL: &str = "-9999";

/// Imperatriz - MA (INMET A225)
pub const DEFAULT_STATION_NAME: &str = "IMPERATRIZ";
pub const DEFAULT_LATITUDE: f64 = -5.52;
pub const DEFAULT_ALTITUDE: f64 = 95.0;

/// Unit conversions applied by the daily aggregator
pub const WIND_10M_TO_2M: f64 = 0.748;
pub const KJ_PER_MJ: f64 = 1000.0;

/// Physical plausibility bounds for the integrity report
pub const MIN_VALID_TEMP: f64 = -50.0;
pub const MAX_VALID_TEMP: f64 = 50.0;
pub const MAX_VALID_HUMIDITY: f64 = 100.0;
pub const MAX_PLAUSIBLE_ETO: f64 = 15.0;
pub const EXTREME_DAILY_RAIN_MM: f64 = 150.0;

/// Tolerances when comparing configured coordinates with a file preamble
pub const PREAMBLE_LATITUDE_TOLERANCE: f64 = 0.05;
pub const PREAMBLE_ALTITUDE_TOLERANCE: f64 = 50.0;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
