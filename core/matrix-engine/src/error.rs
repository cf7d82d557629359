//! FILENAME: core/matrix-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("Grouping needs at least one row attribute")]
    EmptyRowAttributes,

    #[error("Row attribute listed twice: {0}")]
    DuplicateRowAttribute(String),

    #[error("Column attribute duplicates a row attribute: {0}")]
    ColumnDuplicatesRow(String),

    #[error("Key '{key}' claimed by both band '{first}' and band '{second}'")]
    DuplicateBandMember {
        key: String,
        first: String,
        second: String,
    },

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, MatrixError>;
