//! Table cleaning: one linear pass over a private copy of the input.
//!
//! ```text
//!   &Dataset ──► dedup ──► dates (per requested column) ──► classify ──► CleanReport
//! ```

pub mod classify;
pub mod dates;
pub mod dedup;

use thiserror::Error;

use crate::data::model::Dataset;

pub use classify::{classify, ColumnClassification};
pub use dates::{parse_datetime, DateConversionError};
pub use dedup::drop_duplicates;

/// Non-fatal diagnostics collected while cleaning.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CleanWarning {
    #[error("column '{column}' not found in the dataset")]
    MissingColumn { column: String },
    #[error("could not convert column '{column}' to dates: {source}")]
    ConversionFailed {
        column: String,
        source: DateConversionError,
    },
}

/// Everything produced by [`clean`].
#[derive(Debug, Clone)]
pub struct CleanReport {
    /// The cleaned copy.
    pub dataset: Dataset,
    pub columns: ColumnClassification,
    pub warnings: Vec<CleanWarning>,
    pub duplicates_removed: usize,
}

impl CleanReport {
    /// True when no warning was raised.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Deduplicate rows, convert the requested columns to dates and classify the
/// remaining columns.
///
/// Never fails: missing columns and unconvertible columns are reported in
/// [`CleanReport::warnings`], malformed date values become missing.
pub fn clean<S: AsRef<str>>(dataset: &Dataset, date_columns: &[S]) -> CleanReport {
    log::info!(
        "Preprocessing {} rows x {} columns",
        dataset.height(),
        dataset.width()
    );

    let mut working = drop_duplicates(dataset);
    let duplicates_removed = dataset.height() - working.height();
    log::info!("Removed {duplicates_removed} duplicate rows");

    let mut warnings = Vec::new();
    for name in date_columns.iter().map(AsRef::as_ref) {
        let Some(index) = working.position(name) else {
            let warning = CleanWarning::MissingColumn {
                column: name.to_string(),
            };
            log::warn!("{warning}");
            warnings.push(warning);
            continue;
        };

        match dates::convert_column(&working.columns()[index]) {
            Ok(converted) => {
                log::debug!(
                    "Converted column '{name}' to dates ({} missing of {})",
                    converted.null_count(),
                    converted.len()
                );
                working.replace_column(index, converted);
            }
            Err(source) => {
                let warning = CleanWarning::ConversionFailed {
                    column: name.to_string(),
                    source,
                };
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    let columns = classify(&working, date_columns);
    let (categorical, numerical, converted_date) = columns.counts();
    log::info!(
        "Categorical columns: {categorical}, numerical columns: {numerical}, converted date columns: {converted_date}"
    );

    CleanReport {
        dataset: working,
        columns,
        warnings,
        duplicates_removed,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::{CellValue, Column, DType};

    fn signups() -> Dataset {
        Dataset::new(vec![
            Column::new("id", [1i64, 1, 2]),
            Column::new("name", ["a", "a", "b"]),
            Column::new("signup", ["2020-01-01", "2020-01-01", "bad"]),
        ])
        .unwrap()
    }

    #[test]
    fn cleans_end_to_end() {
        let report = clean(&signups(), &["signup"]);

        assert_eq!(report.dataset.height(), 2);
        assert_eq!(report.duplicates_removed, 1);
        let signup = report.dataset.column("signup").unwrap();
        assert_eq!(signup.dtype(), DType::Datetime);
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(signup.values(), &[CellValue::Date(day), CellValue::Null]);

        assert_eq!(report.columns.numerical, vec!["id"]);
        assert_eq!(report.columns.categorical, vec!["name"]);
        assert_eq!(report.columns.converted_date, vec!["signup"]);
        assert!(report.is_clean());
    }

    #[test]
    fn leaves_input_untouched() {
        let input = signups();
        let before = input.clone();
        let _ = clean(&input, &["signup"]);
        assert_eq!(input, before);
    }

    #[test]
    fn unknown_column_is_a_warning() {
        let report = clean(&signups(), &["nonexistent_col"]);
        assert!(report.columns.converted_date.is_empty());
        assert_eq!(
            report.warnings,
            vec![CleanWarning::MissingColumn {
                column: "nonexistent_col".into()
            }]
        );
        assert_eq!(report.columns.categorical, vec!["name", "signup"]);
    }

    #[test]
    fn incompatible_column_is_left_unchanged() {
        let report = clean(&signups(), &["id", "signup"]);
        let id = report.dataset.column("id").unwrap();
        assert_eq!(id.dtype(), DType::Int64);
        assert_eq!(id.values(), &[CellValue::Integer(1), CellValue::Integer(2)]);
        assert_eq!(
            report.warnings,
            vec![CleanWarning::ConversionFailed {
                column: "id".into(),
                source: DateConversionError::IncompatibleType { dtype: DType::Int64 },
            }]
        );
        assert_eq!(report.columns.converted_date, vec!["id", "signup"]);
        assert!(report.columns.numerical.is_empty());
    }

    #[test]
    fn repeated_date_column_is_idempotent() {
        let once = clean(&signups(), &["signup"]);
        let twice = clean(&signups(), &["signup", "signup"]);
        assert_eq!(once.dataset, twice.dataset);
        assert_eq!(twice.columns.converted_date, vec!["signup"]);
    }

    #[test]
    fn empty_dataset_is_fine() {
        let report = clean(&Dataset::default(), &["signup"]);
        assert_eq!(report.dataset.width(), 0);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.columns, ColumnClassification::default());
    }
}
