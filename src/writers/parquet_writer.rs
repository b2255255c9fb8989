use arrow::array::{Array, ArrayRef, BooleanArray, Date32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ProcessingError, Result};
use crate::models::{DailyRecord, DaySource};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};

/// Nullable measurement columns, in schema order after `date`
const VALUE_COLUMNS: [&str; 7] = [
    "tmin",
    "tmax",
    "precipitation",
    "relative_humidity",
    "wind_speed_2m",
    "solar_radiation",
    "reference_et",
];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Columnar archive of the daily series
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn write_records(&self, records: &[DailyRecord], path: &Path) -> Result<()> {
        let schema = create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        if !records.is_empty() {
            writer.write(&records_to_batch(records, schema)?)?;
        }
        writer.close()?;

        Ok(())
    }

    /// Read up to `limit` records back
    pub fn read_records(&self, path: &Path, limit: usize) -> Result<Vec<DailyRecord>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut records = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;
            let remaining = limit - records.len();
            records.extend(batch_to_records(&batch, remaining)?);

            if records.len() >= limit {
                break;
            }
        }

        Ok(records)
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();
        let compression = if row_groups > 0 && metadata.row_group(0).num_columns() > 0 {
            metadata.row_group(0).column(0).compression()
        } else {
            self.compression
        };

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn create_schema() -> Arc<Schema> {
    let mut fields = vec![Field::new("date", DataType::Date32, false)];
    fields.extend(
        VALUE_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, true)),
    );
    fields.push(Field::new("reindexed", DataType::Boolean, false));

    Arc::new(Schema::new(fields))
}

fn records_to_batch(records: &[DailyRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
    let epoch = epoch();
    let dates: Vec<i32> = records
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();

    let column = |get: fn(&DailyRecord) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(records.iter().map(get).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(dates)),
        column(|r| r.tmin),
        column(|r| r.tmax),
        column(|r| r.precipitation),
        column(|r| r.relative_humidity),
        column(|r| r.wind_speed_2m),
        column(|r| r.solar_radiation),
        column(|r| r.reference_et),
        Arc::new(BooleanArray::from(
            records.iter().map(|r| r.is_reindexed()).collect::<Vec<_>>(),
        )),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn batch_to_records(batch: &RecordBatch, limit: usize) -> Result<Vec<DailyRecord>> {
    let invalid = |name: &str| ProcessingError::InvalidFormat(format!("Invalid {} column type", name));

    let expected = VALUE_COLUMNS.len() + 2;
    if batch.num_columns() < expected {
        return Err(ProcessingError::InvalidFormat(format!(
            "Expected {} columns, found {}",
            expected,
            batch.num_columns()
        )));
    }

    let dates = batch
        .column(0)
        .as_any()
        .downcast_ref::<Date32Array>()
        .ok_or_else(|| invalid("date"))?;

    let mut values = Vec::with_capacity(VALUE_COLUMNS.len());
    for (i, name) in VALUE_COLUMNS.iter().enumerate() {
        let array = batch
            .column(i + 1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| invalid(name))?;
        values.push(array);
    }

    let reindexed = batch
        .column(VALUE_COLUMNS.len() + 1)
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| invalid("reindexed"))?;

    let value = |col: usize, row: usize| {
        let array = values[col];
        (!array.is_null(row)).then(|| array.value(row))
    };

    let epoch = epoch();
    let mut records = Vec::new();
    for i in 0..batch.num_rows().min(limit) {
        let date = epoch
            .checked_add_signed(chrono::Duration::days(dates.value(i) as i64))
            .ok_or_else(|| ProcessingError::InvalidFormat("Invalid date in Parquet file".into()))?;

        records.push(DailyRecord {
            date,
            tmin: value(0, i),
            tmax: value(1, i),
            precipitation: value(2, i),
            relative_humidity: value(3, i),
            wind_speed_2m: value(4, i),
            solar_radiation: value(5, i),
            reference_et: value(6, i),
            source: if reindexed.value(i) {
                DaySource::Reindexed
            } else {
                DaySource::Observed
            },
        });
    }

    Ok(records)
}

#[derive(Debug, Clone)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn sample_records() -> Vec<DailyRecord> {
        let date = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
        let observed = DailyRecord::builder(date)
            .temperatures(20.0, 32.0)
            .precipitation(0.0)
            .relative_humidity(65.0)
            .wind_speed_2m(1.496)
            .solar_radiation(18.0)
            .reference_et(4.3208)
            .build();
        let mut gap = DailyRecord::empty(date.succ_opt().unwrap(), DaySource::Reindexed);
        gap.precipitation = Some(0.0);

        vec![observed, gap]
    }

    #[test]
    fn test_write_empty_records() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        ParquetWriter::new().write_records(&[], temp_file.path())?;

        let info = ParquetWriter::new().get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 0);
        Ok(())
    }

    #[test]
    fn test_records_read_back() -> Result<()> {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new()?;
        let records = sample_records();

        writer.write_records(&records, temp_file.path())?;
        let read = writer.read_records(temp_file.path(), 10)?;

        assert_eq!(read, records);
        assert_eq!(writer.read_records(temp_file.path(), 1)?.len(), 1);

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 2);
        assert!(info.summary().contains("Total rows: 2"));

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_records(&sample_records(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli9000").is_err());
        Ok(())
    }

    #[test]
    fn test_short_schema_rejected() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let schema = Arc::new(Schema::new(vec![Field::new("date", DataType::Date32, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Date32Array::from(vec![19007, 19008])) as ArrayRef],
        )?;

        let mut writer = ArrowWriter::try_new(File::create(temp_file.path())?, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        let err = ParquetWriter::new().read_records(temp_file.path(), 5).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidFormat(_)), "{}", err);
        Ok(())
    }
}
