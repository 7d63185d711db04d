use thiserror::Error;

/// File-level import failures. Row-level problems never surface here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Could not read document text ({0}); try exporting the statement as CSV instead")]
    Extraction(String),
    #[error("No transactions found")]
    EmptyBatch,
}
