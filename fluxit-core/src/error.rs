//! Error types for fluxit-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The namespace root handed to discovery is not a directory.
    #[error("invalid namespace root: {path} is not a directory")]
    NotADirectory { path: PathBuf },

    /// A field value was rejected by its validator.
    #[error("invalid value for {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// A string could not be parsed into one of the closed enums.
    #[error("unknown {kind} '{value}'; expected one of: {expected}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
