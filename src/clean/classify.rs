use serde::Serialize;

use crate::data::model::{DType, Dataset};

/// Partition of a dataset's columns for downstream reporting.
///
/// The three lists are disjoint and keep dataset column order, except
/// `converted_date` which keeps the order the names were requested in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnClassification {
    pub numerical: Vec<String>,
    pub categorical: Vec<String>,
    pub converted_date: Vec<String>,
}

impl ColumnClassification {
    /// `(categorical, numerical, converted_date)` counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.categorical.len(),
            self.numerical.len(),
            self.converted_date.len(),
        )
    }
}

/// Classify columns by dtype after date conversion.
///
/// * `converted_date`: requested names present in the dataset, whatever
///   their conversion outcome
/// * `numerical`: `Int64` / `Float64` columns not in `converted_date`
/// * `categorical`: `Object` columns not in `converted_date`
///
/// Anything else (booleans, all-missing columns, unrequested datetimes) is
/// left out.
pub fn classify<S: AsRef<str>>(dataset: &Dataset, date_columns: &[S]) -> ColumnClassification {
    let mut converted_date: Vec<String> = Vec::new();
    for name in date_columns.iter().map(AsRef::as_ref) {
        if dataset.column(name).is_some() && !converted_date.iter().any(|c| c == name) {
            converted_date.push(name.to_string());
        }
    }

    let mut numerical = Vec::new();
    let mut categorical = Vec::new();
    for column in dataset.columns() {
        let name = column.name();
        if converted_date.iter().any(|c| c == name) {
            continue;
        }
        match column.dtype() {
            dtype if dtype.is_numeric() => numerical.push(name.to_string()),
            DType::Object => categorical.push(name.to_string()),
            _ => {}
        }
    }

    ColumnClassification {
        numerical,
        categorical,
        converted_date,
    }
}
