use std::time::Duration;

use thiserror::Error;

/// Failures of the raw page store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("raw store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("raw store database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("raw store lock poisoned")]
    Poisoned,
}

/// A single failed fetch attempt. Every variant is treated as transient.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// A raw page exists for an identifier the catalog does not know.
    #[error("catalog has no row for identifier '{identifier}' (catalog and raw store are out of sync)")]
    MissingCatalogRow { identifier: String },

    #[error("page '{identifier}' does not match layout {layout}: anchor {anchor} not found")]
    LayoutMismatch {
        identifier: String,
        layout: &'static str,
        anchor: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("catalog contains no course packages")]
    NoPackages,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("dataset serialization failed: {0}")]
    Dataset(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
