use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Input file '{0}' not found")]
    InputNotFound(PathBuf),

    #[error("Failed to read CSV '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Failed to write CSV '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("I/O error on '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Table has no rows")]
    EmptyTable,

    #[error("Table has no date column")]
    NoDateColumn,

    #[error("Required column '{0}' not found")]
    MissingColumn(String),

    #[error("Column '{column}' holds a value that is not an ISO 8601 date at row {row}: '{value}'")]
    InvalidDate {
        column: String,
        row: usize,
        value: String,
    },
}
