//! Tabular dataset cleaning: deduplicate rows, coerce requested columns to
//! dates and classify columns into numerical, categorical and date groups.

pub mod clean;
pub mod data;

pub use clean::{clean, CleanReport, CleanWarning, ColumnClassification};
pub use data::{CellValue, Column, DType, Dataset};
