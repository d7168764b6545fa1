//! Error types for the report pipelines.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{table}: missing required columns: {}", .missing.join(", "))]
    SchemaMismatch { table: String, missing: Vec<String> },

    #[error("{table}: row {row}: invalid value {value:?} in column {column}")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("count total overflows while aggregating {0}")]
    CountOverflow(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
