use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::data::model::{CellValue, Column, DType};

/// Datetime layouts tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts; parsed values land on midnight.
/// Slash dates are month-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y%m%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateConversionError {
    #[error("a column of dtype {dtype} cannot be interpreted as dates")]
    IncompatibleType { dtype: DType },
}

/// Best-effort parse of a text value into a naive datetime.
///
/// Values carrying a UTC offset are normalised to UTC and the offset dropped.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Coerce a single cell: dates stay, parsable text becomes a date, anything
/// else becomes missing.
pub fn coerce_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Date(d) => CellValue::Date(*d),
        CellValue::Text(s) => parse_datetime(s).map_or(CellValue::Null, CellValue::Date),
        _ => CellValue::Null,
    }
}

/// Convert a whole column to dates, value by value.
///
/// Numeric and boolean columns are rejected outright and left to the caller
/// to keep unchanged.
pub fn convert_column(column: &Column) -> Result<Column, DateConversionError> {
    match column.dtype() {
        DType::Int64 | DType::Float64 | DType::Boolean => Err(DateConversionError::IncompatibleType {
            dtype: column.dtype(),
        }),
        DType::Object | DType::Datetime | DType::Null => {
            let values = column.values().iter().map(coerce_cell).collect();
            Ok(Column::with_dtype(column.name(), DType::Datetime, values))
        }
    }
}
