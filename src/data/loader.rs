use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – any flat Parquet file
/// * `.json`    – `[{ "col": value, ... }, ...]` (records-oriented)
/// * `.csv`     – header row followed by data rows
///
/// Date columns are never inferred here; text stays text until the cleaner
/// is asked to convert it.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        dataset.height(),
        dataset.width(),
        path.display()
    );
    Ok(dataset)
}

/// Assemble per-column cell buffers into a dataset.
fn assemble(names: Vec<String>, cells: Vec<Vec<CellValue>>) -> Result<Dataset> {
    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Dataset::new(columns)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "id": 1, "name": "a", "signup": "2020-01-01" },
///   ...
/// ]
/// ```
///
/// Column order follows first appearance; a key absent from a row is missing.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    let mut cells: Vec<Vec<CellValue>> = Vec::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
                // Back-fill earlier rows that lacked this key.
                cells.push(vec![CellValue::Null; i]);
            }
        }
        for (name, column) in names.iter().zip(cells.iter_mut()) {
            column.push(obj.get(name).map_or(CellValue::Null, json_to_cell));
        }
    }

    assemble(names, cells)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let names: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(guess_cell_type(record.get(col_idx).unwrap_or("")));
        }
    }

    assemble(names, cells)
}

pub(crate) fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];

    let reader = builder.build().context("building parquet reader")?;
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            let values = array_to_cells(array)
                .with_context(|| format!("reading column '{}'", names[col_idx]))?;
            column.extend(values);
        }
    }

    assemble(names, cells)
}

// -- Arrow helpers --

/// Convert one Arrow array into cells.
pub(crate) fn array_to_cells(col: &ArrayRef) -> Result<Vec<CellValue>> {
    let n = col.len();
    let cells = match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let strings = cast(col, &DataType::Utf8)?;
            let strings = strings.as_string::<i32>();
            (0..n)
                .map(|i| cell_or_null(strings, i, || CellValue::Text(strings.value(i).to_string())))
                .collect()
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            // Out-of-range UInt64 values become null.
            let ints = cast(col, &DataType::Int64)?;
            let ints = ints.as_primitive::<Int64Type>();
            (0..n)
                .map(|i| cell_or_null(ints, i, || CellValue::Integer(ints.value(i))))
                .collect()
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let floats = cast(col, &DataType::Float64)?;
            let floats = floats.as_primitive::<Float64Type>();
            (0..n)
                .map(|i| cell_or_null(floats, i, || CellValue::Float(floats.value(i))))
                .collect()
        }
        DataType::Boolean => {
            let bools = col.as_boolean();
            (0..n)
                .map(|i| cell_or_null(bools, i, || CellValue::Bool(bools.value(i))))
                .collect()
        }
        DataType::Date32 => {
            let dates = col.as_primitive::<Date32Type>();
            (0..n)
                .map(|i| cell_or_null(dates, i, || date_cell(dates.value_as_datetime(i))))
                .collect()
        }
        DataType::Date64 => {
            let dates = col.as_primitive::<Date64Type>();
            (0..n)
                .map(|i| cell_or_null(dates, i, || date_cell(dates.value_as_datetime(i))))
                .collect()
        }
        // Instants are read as UTC wall-clock time; any zone is dropped.
        DataType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => {
                let ts = col.as_primitive::<TimestampSecondType>();
                (0..n)
                .map(|i| cell_or_null(ts, i, || date_cell(ts.value_as_datetime(i))))
                .collect()
            }
            TimeUnit::Millisecond => {
                let ts = col.as_primitive::<TimestampMillisecondType>();
                (0..n)
                .map(|i| cell_or_null(ts, i, || date_cell(ts.value_as_datetime(i))))
                .collect()
            }
            TimeUnit::Microsecond => {
                let ts = col.as_primitive::<TimestampMicrosecondType>();
                (0..n)
                .map(|i| cell_or_null(ts, i, || date_cell(ts.value_as_datetime(i))))
                .collect()
            }
            TimeUnit::Nanosecond => {
                let ts = col.as_primitive::<TimestampNanosecondType>();
                (0..n)
                .map(|i| cell_or_null(ts, i, || date_cell(ts.value_as_datetime(i))))
                .collect()
            }
        },
        DataType::Null => vec![CellValue::Null; n],
        _ => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())?;
            (0..n)
                .map(|i| cell_or_null(col.as_ref(), i, || CellValue::Text(formatter.value(i).to_string())))
                .collect()
        }
    };
    Ok(cells)
}

fn cell_or_null(array: &dyn Array, row: usize, value: impl FnOnce() -> CellValue) -> CellValue {
    if array.is_null(row) {
        CellValue::Null
    } else {
        value()
    }
}

fn date_cell(value: Option<chrono::NaiveDateTime>) -> CellValue {
    value.map_or(CellValue::Null, CellValue::Date)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Date32Array, Int32Array, StringArray, TimestampMillisecondArray};

    use super::*;
    use crate::data::model::DType;

    #[test]
    fn guesses_csv_cell_types() {
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("42"), CellValue::Integer(42));
        assert_eq!(guess_cell_type("4.5"), CellValue::Float(4.5));
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("2020-01-01"), CellValue::Text("2020-01-01".into()));
    }

    #[test]
    fn loads_csv_with_missing_cells() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "id,score,city").unwrap();
        writeln!(file, "1,2.5,Oslo").unwrap();
        writeln!(file, "2,,Bergen").unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.height(), 2);
        assert_eq!(ds.column_names(), vec!["id", "score", "city"]);
        assert_eq!(ds.column("id").unwrap().dtype(), DType::Int64);
        assert_eq!(ds.column("score").unwrap().dtype(), DType::Float64);
        assert_eq!(ds.column("score").unwrap().values()[1], CellValue::Null);
        assert_eq!(ds.column("city").unwrap().dtype(), DType::Object);
    }

    #[test]
    fn loads_json_records_with_sparse_keys() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"a": 1}}, {{"a": 2, "b": "x"}}, {{"b": null}}]"#).unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert_eq!(
            ds.column("a").unwrap().values(),
            &[CellValue::Integer(1), CellValue::Integer(2), CellValue::Null]
        );
        assert_eq!(
            ds.column("b").unwrap().values(),
            &[CellValue::Null, CellValue::Text("x".into()), CellValue::Null]
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn converts_arrow_arrays() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(7), None]));
        assert_eq!(
            array_to_cells(&ints).unwrap(),
            vec![CellValue::Integer(7), CellValue::Null]
        );

        let text: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), None]));
        assert_eq!(
            array_to_cells(&text).unwrap(),
            vec![CellValue::Text("a".into()), CellValue::Null]
        );

        let ts: ArrayRef = Arc::new(TimestampMillisecondArray::from(vec![Some(86_400_000), None]));
        let cells = array_to_cells(&ts).unwrap();
        assert_eq!(cells[0].to_string(), "1970-01-02 00:00:00");
        assert_eq!(cells[1], CellValue::Null);
    }

    #[test]
    fn null_temporal_slots_stay_missing() {
        let dates: ArrayRef = Arc::new(Date32Array::from(vec![None, Some(18_262), None]));
        let cells = array_to_cells(&dates).unwrap();
        assert_eq!(cells[0], CellValue::Null);
        assert_eq!(cells[1].to_string(), "2020-01-01 00:00:00");
        assert_eq!(cells[2], CellValue::Null);
    }

    #[test]
    fn csv_float_column_upcasts_integers() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "x").unwrap();
        writeln!(file, "1").unwrap();
        writeln!(file, "1.0").unwrap();
        writeln!(file, "2.5").unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path()).unwrap();
        let x = ds.column("x").unwrap();
        assert_eq!(x.dtype(), DType::Float64);
        assert_eq!(
            x.values(),
            &[CellValue::Float(1.0), CellValue::Float(1.0), CellValue::Float(2.5)]
        );
    }
}
