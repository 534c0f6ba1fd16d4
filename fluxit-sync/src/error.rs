//! Error types for fluxit-sync.

use std::path::PathBuf;

use thiserror::Error;

use fluxit_renderer::RenderError;

/// Failures while persisting a single output file.
///
/// These never stop a run; the orchestrator records them and moves on.
#[derive(Debug, Error)]
pub enum PersistError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The confirmation prompt itself failed (not an operator interrupt).
    #[error("confirmation prompt failed: {0}")]
    Prompt(String),
}

/// Run-wide failures. Anything here means nothing was written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Convenience constructor for [`PersistError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.into(),
        source,
    }
}
