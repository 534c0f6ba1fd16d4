//! Persistence decision engine and atomic writer.
//!
//! ## Decision per output path
//!
//! 1. Existing content equals the new content → `SkipUnchanged`, no prompt.
//! 2. Policy `always`, or `if-exists` with a file present → review:
//!    approved → `Write`, declined → `SkipDeclined`, interrupted → `Abort`.
//! 3. Policy `never` with a file present → `Write`, with a warning.
//! 4. Otherwise → `Write`.
//!
//! ## `atomic_write`
//!
//! Write to `<path>.fluxit.tmp`, then rename over the final path.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fluxit_core::ConfirmPolicy;

use crate::diff::{generate_diff, UnifiedDiff};
use crate::error::{io_err, PersistError};

// ---------------------------------------------------------------------------
// Existing file state
// ---------------------------------------------------------------------------

/// What is currently on disk at an output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingFile {
    Missing,
    Readable(String),
    /// Present but could not be read; reviewed like a new file.
    Unreadable,
}

impl ExistingFile {
    pub fn read(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => ExistingFile::Readable(content),
            Err(e) if e.kind() == ErrorKind::NotFound => ExistingFile::Missing,
            Err(e) => {
                tracing::warn!("could not read file {}: {e}", path.display());
                ExistingFile::Unreadable
            }
        }
    }

    pub fn exists(&self) -> bool {
        !matches!(self, ExistingFile::Missing)
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// What the operator is shown before approving a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Diff(UnifiedDiff),
    NewContent(String),
}

/// Outcome of the pure half of the decision, before any prompt or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    Unchanged,
    NeedsReview { preview: Preview },
    DirectWrite { overwrite: bool },
}

/// Decide what should happen to `new` given the policy and what is on disk.
///
/// `name` labels the diff headers.
pub fn assess(policy: ConfirmPolicy, existing: &ExistingFile, new: &str, name: &str) -> Assessment {
    if let ExistingFile::Readable(old) = existing {
        if old == new {
            return Assessment::Unchanged;
        }
    }

    let exists = existing.exists();
    let review = match policy {
        ConfirmPolicy::Always => true,
        ConfirmPolicy::IfExists => exists,
        ConfirmPolicy::Never => false,
    };
    if !review {
        return Assessment::DirectWrite { overwrite: exists };
    }

    let preview = match existing {
        ExistingFile::Readable(old) if !old.is_empty() => {
            Preview::Diff(generate_diff(old, new, name))
        }
        _ => Preview::NewContent(new.to_string()),
    };
    Assessment::NeedsReview { preview }
}

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Approved,
    Declined,
    /// The operator interrupted the prompt; the whole run stops.
    Interrupted,
}

/// Everything a confirmer needs to present one pending write.
#[derive(Debug, Clone, Copy)]
pub struct Review<'a> {
    pub path: &'a Path,
    pub exists: bool,
    pub preview: &'a Preview,
}

/// Asks the operator whether a reviewed write may go ahead.
pub trait Confirmer {
    fn confirm(&mut self, review: &Review<'_>) -> Result<Confirmation, PersistError>;
}

/// Confirmer for runs without a terminal: every review is declined.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Confirmer for NonInteractive {
    fn confirm(&mut self, review: &Review<'_>) -> Result<Confirmation, PersistError> {
        tracing::warn!(
            "review required but running non-interactively: {}",
            review.path.display()
        );
        Ok(Confirmation::Declined)
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceDecision {
    Write,
    SkipUnchanged,
    SkipDeclined,
    Abort,
}

/// Decide, confirm if needed, and write `content` to `path`.
///
/// An `Err` concerns this path only. [`PersistenceDecision::Abort`] asks the
/// caller to stop processing any further paths.
pub fn confirm_and_save(
    path: &Path,
    content: &str,
    policy: ConfirmPolicy,
    confirmer: &mut dyn Confirmer,
) -> Result<PersistenceDecision, PersistError> {
    let existing = ExistingFile::read(path);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match assess(policy, &existing, content, &name) {
        Assessment::Unchanged => {
            tracing::info!("skipped (no changes): {}", path.display());
            Ok(PersistenceDecision::SkipUnchanged)
        }
        Assessment::NeedsReview { preview } => {
            let review = Review {
                path,
                exists: existing.exists(),
                preview: &preview,
            };
            match confirmer.confirm(&review)? {
                Confirmation::Approved => {
                    atomic_write(path, content)?;
                    tracing::info!("saved: {}", path.display());
                    Ok(PersistenceDecision::Write)
                }
                Confirmation::Declined => {
                    tracing::info!("skipped: {}", path.display());
                    Ok(PersistenceDecision::SkipDeclined)
                }
                Confirmation::Interrupted => {
                    tracing::warn!("user interrupted, quitting");
                    Ok(PersistenceDecision::Abort)
                }
            }
        }
        Assessment::DirectWrite { overwrite } => {
            if overwrite {
                tracing::warn!(
                    "overwriting existing file due to --confirm=never: {}",
                    path.display()
                );
            }
            atomic_write(path, content)?;
            tracing::info!("saved: {}", path.display());
            Ok(PersistenceDecision::Write)
        }
    }
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Write `content` to `path`, creating parent directories as needed.
///
/// Readers see either the previous file or the complete new one.
pub fn atomic_write(path: &Path, content: &str) -> Result<(), PersistError> {
    let tmp = PathBuf::from(format!("{}.fluxit.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!("wrote: {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
