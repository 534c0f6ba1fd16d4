//! Error types for fluxit-renderer.
//!
//! Every variant is fatal for the run: the renderer never hands back a
//! partial result.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template base path does not exist or is not a directory.
    #[error("template path does not exist or is not a directory: {path}")]
    TemplateDirMissing { path: PathBuf },

    /// A template referenced a variable absent from the context.
    #[error("{} -> No value provided for template var: {variable}", template.display())]
    UndefinedVariable { template: PathBuf, variable: String },

    /// Any other failure while rendering a specific template.
    #[error("failed to render template {}: {source}", template.display())]
    Template {
        template: PathBuf,
        #[source]
        source: tera::Error,
    },

    /// A template set failed to parse (syntax, unknown parent, ...).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while discovering or loading templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
