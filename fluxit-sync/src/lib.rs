//! # fluxit-sync
//!
//! Canonicalization, change detection and the confirm-and-persist pipeline.
//!
//! Call [`run`] with a loaded [`fluxit_renderer::Renderer`] to render every
//! template once and decide, file by file, whether to write, skip or abort.
//! [`generate`] does discovery and loading as well.

pub mod canonical;
pub mod diff;
mod emitter;
pub mod error;
pub mod pipeline;
pub mod writer;

pub use canonical::{canonicalize, CanonicalDocument, UnparsedReason};
pub use diff::{generate_diff, DiffLine, DiffLineKind, UnifiedDiff};
pub use error::{PersistError, PipelineError};
pub use pipeline::{generate, run, FileOutcome, FileStatus, RunOutcome, RunReport};
pub use writer::{
    assess, atomic_write, confirm_and_save, Assessment, Confirmation, Confirmer, ExistingFile,
    NonInteractive, PersistenceDecision, Preview, Review,
};
