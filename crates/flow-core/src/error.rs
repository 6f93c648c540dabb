use std::path::PathBuf;
use thiserror::Error;

/// Errors raised at the edges of the metrics engine (files, config).
///
/// The derivation engine itself never fails: bad dates, unmapped fields and
/// malformed annotations degrade to "no value" instead.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The input path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No `.json` / `.jsonl` row files were found under the given directory.
    #[error("No row files found in {0}")]
    NoDataFiles(PathBuf),

    /// Every row failed admission (or there were no rows at all).
    #[error("No valid rows: {rejected} of {read} rows lack a key or type")]
    NoValidRows { read: usize, rejected: usize },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the flow crates.
pub type Result<T> = std::result::Result<T, MetricsError>;
