pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::{generate_default_parquet_filename, station_slug};
pub use logging::init_tracing;
pub use progress::ProgressReporter;
