//! Data layer: core types, loading, and writing.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset (dtypes inferred once)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Dataset  │  Vec<Column>, each Column = name + DType + Vec<CellValue>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  writer   │  Dataset → .parquet / .json / .csv
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod writer;

pub use model::{CellValue, Column, DType, Dataset, DatasetError};
