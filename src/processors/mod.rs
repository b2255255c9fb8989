pub mod daily_aggregator;
pub mod gap_filler;
pub mod integrity_checker;
pub mod pipeline;
pub mod reference_et;

pub use daily_aggregator::DailyAggregator;
pub use gap_filler::{GapFillReport, GapFiller};
pub use integrity_checker::{DataViolation, IntegrityChecker, IntegrityReport, ViolationType};
pub use pipeline::{DailySeries, ExportSummary, Pipeline};
pub use reference_et::{EtComponents, ReferenceEt};
