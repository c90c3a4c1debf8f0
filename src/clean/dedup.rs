use std::collections::HashSet;

use crate::data::model::Dataset;

/// Indices of the first occurrence of every distinct row, in row order.
pub fn first_occurrences(dataset: &Dataset) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(dataset.height());
    (0..dataset.height())
        .filter(|&row| seen.insert(dataset.row(row)))
        .collect()
}

/// Drop rows that equal an earlier row across every column.
///
/// Returns a new dataset; the input is left untouched.
pub fn drop_duplicates(dataset: &Dataset) -> Dataset {
    let keep = first_occurrences(dataset);
    if keep.len() == dataset.height() {
        return dataset.clone();
    }
    dataset.take_rows(&keep)
}
