use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds that abort a pipeline run. Every variant is recovered at the
/// command boundary and surfaced as a single user-facing message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no row contains the marker column '{marker}'")]
    HeaderNotFound { marker: String },

    #[error("no data rows in {scope}")]
    NoDataRows { scope: String },

    #[error("no group has {threshold} or more rows sharing the key column")]
    NoGroupsAboveThreshold { threshold: usize },

    #[error("unsupported file type '{extension}' for {path:?}; only .xlsx and .xls are accepted")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error("{path:?} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to parse workbook {path:?}")]
    WorkbookParseFailure {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("failed to encode or save {path:?}")]
    EncodeOrSaveFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}
