//! Feature selection and matrix assembly for classifier training.
//!
//! Features are the numeric columns of a slice minus excluded names, kept in
//! the slice's native column order so vector layout is deterministic.

use crate::data::table::{Dataset, LABEL_COLUMN};
use crate::error::PipelineError;

/// Ordered numeric feature columns of the dataset, minus `exclude`.
pub fn numeric_feature_columns(
    data: &Dataset,
    exclude: &[&str],
) -> Result<Vec<String>, PipelineError> {
    let selected: Vec<String> = data
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !exclude.contains(&name.as_str()))
        .filter(|(idx, _)| data.column_is_numeric(*idx))
        .map(|(_, name)| name.clone())
        .collect();

    if selected.is_empty() {
        return Err(PipelineError::NoFeatures);
    }
    Ok(selected)
}

/// Assemble the row-major feature matrix for the given column layout.
///
/// Cells that are missing or non-numeric fill 0.0, as does every cell of a
/// column the dataset lacks. The layout therefore always matches `columns`,
/// even when the dataset drifted from the one the model was trained on.
pub fn feature_matrix(data: &Dataset, columns: &[String]) -> Vec<Vec<f64>> {
    let indices: Vec<Option<usize>> = columns
        .iter()
        .map(|name| data.column_index(name))
        .collect();

    data.rows
        .iter()
        .map(|row| {
            indices
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.get(i))
                        .and_then(|cell| cell.as_f64())
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect()
}

/// Coerce the `Response` column to binary labels.
///
/// Numeric values truncate to integer; non-zero is the positive class.
/// Non-numeric or missing cells fail the call.
pub fn label_vector(data: &Dataset) -> Result<Vec<u8>, PipelineError> {
    let idx = data
        .column_index(LABEL_COLUMN)
        .ok_or(PipelineError::MissingLabel)?;

    let mut labels = Vec::with_capacity(data.len());
    for (row_index, row) in data.rows.iter().enumerate() {
        let value = row
            .get(idx)
            .and_then(|cell| cell.as_f64())
            .ok_or_else(|| {
                PipelineError::Label(format!("row {row_index} has no numeric label"))
            })?;
        labels.push((value.trunc() != 0.0) as u8);
    }
    Ok(labels)
}
