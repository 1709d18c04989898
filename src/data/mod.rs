//! Dataset handling for the training and replay pipeline.
//!
//! This module contains:
//! - The row-major tabular dataset model and CSV ingestion
//! - Timestamp normalization and inclusive time-window slicing
//! - Numeric feature selection and matrix assembly

pub mod features;
pub mod table;
pub mod timeline;

// Re-export commonly used types
pub use features::{feature_matrix, label_vector, numeric_feature_columns};
pub use table::{Dataset, Value, ID_COLUMN, LABEL_COLUMN, TIMESTAMP_COLUMN};
pub use timeline::{ensure_timestamp, format_timestamp, TimedDataset, Window};
