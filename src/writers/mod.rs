pub mod aquacrop_writer;
pub mod daily_csv_writer;
pub mod parquet_writer;

pub use aquacrop_writer::AquaCropWriter;
pub use daily_csv_writer::DailyCsvWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
