use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use super::model::{CellValue, Column, DType, Dataset, DATETIME_FORMAT};

/// Write a dataset to a file.  Dispatch by extension, mirroring
/// [`load_file`](super::loader::load_file).
pub fn write_file(dataset: &Dataset, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => write_parquet(dataset, path),
        "json" => write_json(dataset, path),
        "csv" => write_csv(dataset, path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("writing {}", path.display()))?;

    log::info!(
        "Wrote {} rows x {} columns to {}",
        dataset.height(),
        dataset.width(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer
        .write_record(dataset.column_names())
        .context("writing CSV headers")?;

    for row in 0..dataset.height() {
        let record = dataset.row(row).into_iter().map(|cell| match cell {
            CellValue::Null => String::new(),
            other => other.to_string(),
        });
        writer
            .write_record(record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON (records-oriented)
// ---------------------------------------------------------------------------

fn write_json(dataset: &Dataset, path: &Path) -> Result<()> {
    let names = dataset.column_names();
    let records: Vec<JsonValue> = (0..dataset.height())
        .map(|row| {
            let obj: Map<String, JsonValue> = names
                .iter()
                .zip(dataset.row(row))
                .map(|(name, cell)| (name.to_string(), cell_to_json(cell)))
                .collect();
            JsonValue::Object(obj)
        })
        .collect();

    let file = File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records).context("serialising JSON")?;
    Ok(())
}

fn cell_to_json(cell: &CellValue) -> JsonValue {
    match cell {
        CellValue::Text(s) => JsonValue::String(s.clone()),
        CellValue::Integer(i) => JsonValue::from(*i),
        // Non-finite floats have no JSON form and become null.
        CellValue::Float(f) => JsonValue::from(*f),
        CellValue::Bool(b) => JsonValue::Bool(*b),
        CellValue::Date(d) => JsonValue::String(d.format(DATETIME_FORMAT).to_string()),
        CellValue::Null => JsonValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn write_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    if dataset.width() == 0 {
        bail!("cannot write a dataset without columns to Parquet");
    }

    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = dataset
        .columns()
        .iter()
        .map(|column| {
            let array = column_to_array(column);
            (Field::new(column.name(), array.data_type().clone(), true), array)
        })
        .unzip();

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Build the Arrow array for a column from its dtype.
pub(crate) fn column_to_array(column: &Column) -> ArrayRef {
    let values = column.values();
    match column.dtype() {
        DType::Int64 => Arc::new(Int64Array::from_iter(values.iter().map(|v| match v {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }))),
        DType::Float64 => Arc::new(Float64Array::from_iter(values.iter().map(CellValue::as_f64))),
        DType::Boolean => Arc::new(BooleanArray::from_iter(values.iter().map(|v| match v {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }))),
        DType::Datetime => Arc::new(TimestampMillisecondArray::from_iter(
            values
                .iter()
                .map(|v| v.as_date().map(|d| d.and_utc().timestamp_millis())),
        )),
        DType::Object | DType::Null => Arc::new(StringArray::from_iter(values.iter().map(|v| match v {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }))),
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{DataType, TimeUnit};

    use super::*;

    #[test]
    fn datetime_columns_become_millisecond_timestamps() {
        let day = chrono::NaiveDate::from_ymd_opt(1970, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let column = Column::new("when", [Some(day), None]);
        let array = column_to_array(&column);
        assert_eq!(array.data_type(), &DataType::Timestamp(TimeUnit::Millisecond, None));
        assert_eq!(array.null_count(), 1);
    }

    #[test]
    fn null_columns_become_nullable_strings() {
        let column = Column::new("empty", [CellValue::Null, CellValue::Null]);
        let array = column_to_array(&column);
        assert_eq!(array.data_type(), &DataType::Utf8);
        assert_eq!(array.null_count(), 2);
    }

    #[test]
    fn refuses_columnless_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_file(&Dataset::default(), &dir.path().join("out.parquet")).unwrap_err();
        assert!(format!("{err:#}").contains("without columns"));
    }
}
