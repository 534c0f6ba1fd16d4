//! fluxit — scaffold Kubernetes app manifests from templates.
//!
//! # Usage
//!
//! ```text
//! fluxit [--k8s-app-dir DIR] [--template-dir DIR] [--template NAME]
//!        [--ns NS] [--app-name NAME] [--ingress disabled|http] [--ingress-host HOST]
//!        [--image-repo REPO] [--image-tag TAG] [--deployment-strategy RollingUpdate|Recreate]
//!        [--replicas N] [--service-port PORT] [--include-cm|--no-include-cm]
//!        [--include-secret|--no-include-secret] [--confirm always|never|if-exists]
//!        [--color|--no-color] [--log-level LEVEL] [--non-interactive]
//! ```
//!
//! Missing values are prompted for when stdin is a terminal.

mod fields;
mod prompt;
mod review;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use fluxit_core::{defaults, ConfirmPolicy};
use fluxit_sync::{generate, Confirmer, FileStatus, NonInteractive, RunReport};

use fields::FieldArgs;
use prompt::{DialoguerPrompter, Interrupted};
use review::TerminalConfirmer;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fluxit",
    version,
    about = "Generate Kubernetes application manifests from templates",
    long_about = None,
)]
struct Cli {
    /// Path to the Kubernetes apps directory.
    #[arg(long, env = "FLUXIT_K8S_APP_DIR", default_value = defaults::K8S_APP_DIR)]
    k8s_app_dir: PathBuf,

    /// Path to the base directory containing templates.
    #[arg(long, env = "FLUXIT_TEMPLATE_DIR", default_value = defaults::TEMPLATE_DIR)]
    template_dir: PathBuf,

    /// Name of the template subdirectory within the template directory.
    #[arg(long, env = "FLUXIT_TEMPLATE", default_value = defaults::TEMPLATE)]
    template: String,

    /// Extension marking a file as a template.
    #[arg(long, env = "FLUXIT_TEMPLATE_EXT", default_value = defaults::TEMPLATE_EXTENSION)]
    template_ext: String,

    #[command(flatten)]
    fields: FieldArgs,

    /// When to ask for confirmation before saving/overwriting files.
    #[arg(long, env = "FLUXIT_CONFIRM", default_value_t = defaults::CONFIRM)]
    confirm: ConfirmPolicy,

    /// Enable colorized diff output in confirmation prompts.
    #[arg(long, overrides_with = "no_color", hide = true)]
    color: bool,

    /// Disable colorized diff output in confirmation prompts.
    #[arg(long, overrides_with = "color")]
    no_color: bool,

    /// Logging verbosity. `RUST_LOG` takes precedence when set.
    #[arg(
        long,
        env = "FLUXIT_LOG_LEVEL",
        default_value = defaults::LOG_LEVEL,
        value_parser = ["debug", "info", "warning", "error"],
        ignore_case = true,
    )]
    log_level: String,

    /// Never prompt; implied when stdin is not a terminal.
    #[arg(long, env = "FLUXIT_NON_INTERACTIVE")]
    non_interactive: bool,
}

impl Cli {
    fn use_color(&self) -> bool {
        !self.no_color && (self.color || defaults::COLOR)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Err(err) if err.is::<Interrupted>() => {
            tracing::warn!("user interrupted, quitting");
            Ok(())
        }
        other => other,
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,fluxit={level},fluxit_core={level},fluxit_renderer={level},fluxit_sync={level}"
        ))
    });
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn require_dir(path: &Path, option: &str) -> Result<()> {
    if !path.is_dir() {
        bail!(
            "invalid value for {option}: {} does not exist or is not a directory",
            path.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    tracing::info!("starting fluxit");
    require_dir(&cli.k8s_app_dir, "--k8s-app-dir")?;
    require_dir(&cli.template_dir, "--template-dir")?;

    let color = cli.use_color();
    if !color {
        colored::control::set_override(false);
    }
    let interactive = !cli.non_interactive && std::io::stdin().is_terminal();

    let mut prompter = DialoguerPrompter::new(interactive);
    let params = cli.fields.resolve(&cli.k8s_app_dir, &mut prompter)?;

    let template_path = cli.template_dir.join(&cli.template);
    if !template_path.is_dir() {
        bail!(
            "template path does not exist or is not a directory: {}",
            template_path.display()
        );
    }

    let mut terminal = TerminalConfirmer::new(color);
    let mut offline = NonInteractive;
    let confirmer: &mut dyn Confirmer = if interactive {
        &mut terminal
    } else {
        &mut offline
    };

    let output_root = params.output_root(&cli.k8s_app_dir);
    let report = generate(
        &template_path,
        &cli.template_ext,
        &params.to_context(),
        &output_root,
        cli.confirm,
        confirmer,
    )
    .context("failed during template rendering")?;

    print_report(&params.app_name.0, &report);
    if report.is_aborted() {
        return Err(Interrupted.into());
    }
    tracing::info!("fluxit finished");
    Ok(())
}

fn print_report(app_name: &str, report: &RunReport) {
    if report.outcomes.is_empty() {
        println!("✓ '{app_name}' — nothing to do");
        return;
    }

    let skipped = report
        .outcomes
        .iter()
        .filter(|o| {
            matches!(
                o.status,
                FileStatus::Declined | FileStatus::SkippedUnparsed(_)
            )
        })
        .count();
    println!(
        "✓ '{app_name}' generated ({} written, {} unchanged, {} skipped, {} failed)",
        report.count(&FileStatus::Written),
        report.count(&FileStatus::Unchanged),
        skipped,
        report.failures().count(),
    );

    for outcome in &report.outcomes {
        let marker = match outcome.status {
            FileStatus::Written => "✎",
            FileStatus::Unchanged => "·",
            FileStatus::Declined | FileStatus::SkippedUnparsed(_) => "-",
            FileStatus::Aborted => "!",
            FileStatus::Failed(_) => "✗",
        };
        println!("  {marker}  {}", outcome.path.display());
    }
}
