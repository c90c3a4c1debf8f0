use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Display format used for date cells (CSV output, summaries).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// CellValue – a single cell in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the common DataFrame dtypes.
///
/// Equality, ordering and hashing are total so rows can be used as hash keys
/// during deduplication: floats compare by `total_cmp` after folding every
/// NaN into one value and `-0.0` into `0.0`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// Missing-value marker.
    Null,
}

impl CellValue {
    fn discriminant(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) => 2,
            CellValue::Float(_) => 3,
            CellValue::Text(_) => 4,
            CellValue::Date(_) => 5,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Interpret the value as an `f64` when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Canonical float for comparison and hashing.
fn canonical(v: f64) -> f64 {
    if v.is_nan() {
        f64::NAN
    } else if v == 0.0 {
        0.0
    } else {
        v
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        let (da, db) = (self.discriminant(), other.discriminant());
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => canonical(*a).total_cmp(&canonical(*b)),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => canonical(*f).to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format(DATETIME_FORMAT)),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Integer(v.into())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(v: NaiveDateTime) -> Self {
        CellValue::Date(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// DType – the element type of a column
// ---------------------------------------------------------------------------

/// Column element type, decided once when the column is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int64,
    Float64,
    Boolean,
    Datetime,
    /// Text or a mix of cell kinds.
    Object,
    /// No non-missing cells to infer from.
    Null,
}

impl DType {
    /// Infer a dtype from the non-missing cells of a column.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> DType {
        let mut dtype = DType::Null;
        for value in values {
            let cell = match value {
                CellValue::Null => continue,
                CellValue::Integer(_) => DType::Int64,
                CellValue::Float(_) => DType::Float64,
                CellValue::Bool(_) => DType::Boolean,
                CellValue::Date(_) => DType::Datetime,
                CellValue::Text(_) => return DType::Object,
            };
            dtype = match (dtype, cell) {
                (DType::Null, c) => c,
                (a, b) if a == b => a,
                (DType::Int64, DType::Float64) | (DType::Float64, DType::Int64) => DType::Float64,
                _ => DType::Object,
            };
        }
        dtype
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Boolean => "bool",
            DType::Datetime => "datetime",
            DType::Object => "object",
            DType::Null => "null",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// A named column of cells with its inferred dtype.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DType,
    values: Vec<CellValue>,
}

impl Column {
    /// Build a column, inferring its dtype from the values.
    pub fn new<V: Into<CellValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        let dtype = DType::infer(&values);
        Column::with_dtype(name, dtype, values)
    }

    /// Build a column with an explicit dtype, e.g. a date column whose every
    /// value failed to parse.
    ///
    /// Integer cells in a `Float64` column are upcast so equal numbers compare
    /// equal.
    pub(crate) fn with_dtype(name: impl Into<String>, dtype: DType, mut values: Vec<CellValue>) -> Self {
        if dtype == DType::Float64 {
            for value in &mut values {
                if let CellValue::Integer(i) = *value {
                    *value = CellValue::Float(i as f64);
                }
            }
        }
        Column {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    fn take(&self, rows: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            dtype: self.dtype,
            values: rows.iter().map(|&r| self.values[r].clone()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – ordered, equal-length columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

/// An in-memory table of named, equal-length columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut names = HashSet::with_capacity(columns.len());
        let expected = columns.first().map_or(0, Column::len);
        for column in &columns {
            if !names.insert(column.name()) {
                return Err(DatasetError::DuplicateColumn(column.name().to_string()));
            }
            if column.len() != expected {
                return Err(DatasetError::LengthMismatch {
                    column: column.name().to_string(),
                    expected,
                    found: column.len(),
                });
            }
        }
        Ok(Dataset { columns })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Borrow one row across all columns.
    pub fn row(&self, index: usize) -> Vec<&CellValue> {
        self.columns.iter().map(|c| &c.values[index]).collect()
    }

    /// New dataset holding only the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }

    /// Swap in a converted column of the same length.
    pub(crate) fn replace_column(&mut self, index: usize, column: Column) {
        debug_assert_eq!(column.len(), self.height());
        self.columns[index] = column;
    }
}
