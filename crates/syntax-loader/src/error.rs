use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while reading a source document from disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse document at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Structural problems found by the record validator. All of them abort the
/// run before any row is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("document does not contain the `{grouping_key}` parent element")]
    MissingGrouping { grouping_key: String },
    #[error("`{grouping_key}` must hold a sequence of records")]
    NotASequence { grouping_key: String },
    #[error("record {index} in `{grouping_key}` is not a mapping")]
    NotAMapping { grouping_key: String, index: usize },
    #[error("record {index} in `{grouping_key}` does not contain the `{field}` field")]
    MissingField {
        grouping_key: String,
        index: usize,
        field: String,
    },
}

/// A single failed insert. Recorded per record; never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("record {index} ({class}): {message}")]
pub struct StorageError {
    /// Position of the record inside the grouping sequence.
    pub index: usize,
    /// SQLite error code, or the rusqlite error kind when no code applies.
    pub class: String,
    pub message: String,
    /// Rendered `source()` chain below the top-level message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<String>,
}

/// Fatal errors returned by the loader driver.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to open store at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}
