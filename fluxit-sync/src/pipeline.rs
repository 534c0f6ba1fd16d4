//! Pipeline orchestration: render once, then canonicalize, diff and persist
//! each output path in turn.

use std::path::{Path, PathBuf};

use fluxit_core::{ConfirmPolicy, VariableContext};
use fluxit_renderer::{RenderedArtifact, Renderer, TemplateSet};

use crate::canonical::{canonicalize, CanonicalDocument, UnparsedReason};
use crate::error::PipelineError;
use crate::writer::{confirm_and_save, Confirmer, PersistenceDecision};

/// What happened to one output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Written,
    Unchanged,
    Declined,
    /// Rendered text was not structured data; nothing was written.
    SkippedUnparsed(UnparsedReason),
    /// The operator interrupted the review of this path.
    Aborted,
    /// An I/O or prompt failure local to this path.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Full output path under the output root.
    pub path: PathBuf,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunOutcome {
    #[default]
    Completed,
    /// Stopped early by an operator interrupt. Not an error.
    Aborted,
}

/// Per-path accounting for one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<FileOutcome>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_aborted(&self) -> bool {
        self.outcome == RunOutcome::Aborted
    }

    pub fn count(&self, status: &FileStatus) -> usize {
        self.outcomes.iter().filter(|o| &o.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed(_)))
    }
}

/// Render every template of `renderer` and persist the results under
/// `output_root`.
///
/// A render failure returns `Err` before anything is written. Per-path
/// problems are recorded in the report and do not stop the run; an operator
/// interrupt stops it with [`RunOutcome::Aborted`].
pub fn run(
    renderer: &Renderer,
    ctx: &VariableContext,
    output_root: &Path,
    policy: ConfirmPolicy,
    confirmer: &mut dyn Confirmer,
) -> Result<RunReport, PipelineError> {
    let artifacts = renderer.render(ctx)?;
    tracing::info!("target directory: {}", output_root.display());

    let mut report = RunReport::default();
    for artifact in &artifacts {
        let outcome = process(artifact, output_root, policy, confirmer);
        let aborted = outcome.status == FileStatus::Aborted;
        report.outcomes.push(outcome);
        if aborted {
            report.outcome = RunOutcome::Aborted;
            break;
        }
    }
    Ok(report)
}

/// [`run`] with template discovery and loading from `template_dir`.
pub fn generate(
    template_dir: &Path,
    extension: &str,
    ctx: &VariableContext,
    output_root: &Path,
    policy: ConfirmPolicy,
    confirmer: &mut dyn Confirmer,
) -> Result<RunReport, PipelineError> {
    tracing::info!("using template path: {}", template_dir.display());
    let renderer = Renderer::new(TemplateSet::discover(template_dir, extension)?)?;
    run(&renderer, ctx, output_root, policy, confirmer)
}

fn process(
    artifact: &RenderedArtifact,
    output_root: &Path,
    policy: ConfirmPolicy,
    confirmer: &mut dyn Confirmer,
) -> FileOutcome {
    let path = output_root.join(&artifact.output_path);

    let status = match canonicalize(&artifact.content) {
        CanonicalDocument::Unstructured { reason, .. } => {
            tracing::warn!("skipping invalid YAML file: {}", artifact.template.display());
            FileStatus::SkippedUnparsed(reason)
        }
        CanonicalDocument::Structured { canonical, .. } => {
            match confirm_and_save(&path, &canonical, policy, confirmer) {
                Ok(PersistenceDecision::Write) => FileStatus::Written,
                Ok(PersistenceDecision::SkipUnchanged) => FileStatus::Unchanged,
                Ok(PersistenceDecision::SkipDeclined) => FileStatus::Declined,
                Ok(PersistenceDecision::Abort) => FileStatus::Aborted,
                Err(e) => {
                    tracing::error!(
                        "error processing file {}: {e}",
                        artifact.template.display()
                    );
                    FileStatus::Failed(e.to_string())
                }
            }
        }
    };
    FileOutcome { path, status }
}
