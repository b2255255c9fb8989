pub mod daily;
pub mod export;
pub mod observation;
pub mod station;

pub use daily::{DailyCsvRow, DailyField, DailyRecord, DailyRecordBuilder, DaySource};
pub use export::{round2, ExportRow, WeatherDay};
pub use observation::{CanonicalField, RawObservation};
pub use station::{StationMetadata, StationPreamble};
