//! End-to-end runs of the pipeline against throwaway template and output trees.

use std::fs;
use std::path::{Path, PathBuf};

use fluxit_core::{ConfirmPolicy, VariableContext};
use fluxit_sync::{
    generate, Confirmation, Confirmer, FileStatus, PersistError, Preview, Review, RunOutcome,
    UnparsedReason,
};
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write");
}

/// Answers from a queue and remembers what it was shown.
struct Scripted {
    answers: Vec<Confirmation>,
    seen: Vec<(PathBuf, bool)>,
}

impl Scripted {
    fn new(answers: &[Confirmation]) -> Self {
        Scripted {
            answers: answers.iter().rev().copied().collect(),
            seen: Vec::new(),
        }
    }
}

impl Confirmer for Scripted {
    fn confirm(&mut self, review: &Review<'_>) -> Result<Confirmation, PersistError> {
        let is_diff = matches!(review.preview, Preview::Diff(_));
        self.seen.push((review.path.to_path_buf(), is_diff));
        Ok(self.answers.pop().unwrap_or(Confirmation::Declined))
    }
}

struct Fixture {
    templates: TempDir,
    output: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            templates: TempDir::new().expect("templates"),
            output: TempDir::new().expect("output"),
        }
    }

    fn template(&self, rel: &str, content: &str) {
        write(self.templates.path(), rel, content);
    }

    fn out(&self) -> PathBuf {
        self.output.path().join("default").join("echo")
    }

    fn run(
        &self,
        ext: &str,
        ctx: &VariableContext,
        policy: ConfirmPolicy,
        confirmer: &mut dyn Confirmer,
    ) -> Result<fluxit_sync::RunReport, fluxit_sync::PipelineError> {
        generate(self.templates.path(), ext, ctx, &self.out(), policy, confirmer)
    }
}

#[test]
fn skip_sentinel_and_direct_write_scenario() {
    let fx = Fixture::new();
    fx.template("a.tmpl", "key: {{v}}\n");
    fx.template("b.tmpl", "__SKIP__");

    let ctx = VariableContext::new().with("v", "x");
    let mut confirmer = Scripted::new(&[]);
    let report = fx
        .run("tmpl", &ctx, ConfirmPolicy::Never, &mut confirmer)
        .expect("run");

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].path, fx.out().join("a"));
    assert_eq!(report.outcomes[0].status, FileStatus::Written);
    assert_eq!(fs::read_to_string(fx.out().join("a")).unwrap(), "key: x\n");
    assert!(!fx.out().join("b").exists());
    assert!(confirmer.seen.is_empty());
}

#[test]
fn undefined_variable_writes_nothing() {
    let fx = Fixture::new();
    fx.template("a.yaml.j2", "name: {{ app_name }}\n");
    fx.template("b.yaml.j2", "tag: {{ image_tag }}\n");

    let ctx = VariableContext::new().with("app_name", "echo");
    let mut confirmer = Scripted::new(&[]);
    let err = fx
        .run("j2", &ctx, ConfirmPolicy::Never, &mut confirmer)
        .expect_err("render must fail");

    assert!(err.to_string().contains("image_tag"));
    assert!(!fx.out().exists(), "no output may be written on a fatal render error");
}

#[test]
fn output_is_written_in_canonical_form() {
    let fx = Fixture::new();
    fx.template(
        "app/deploy.yaml.j2",
        "spec:\n    replicas:   {{ replicas }}\n    args: [\"--port\", '{{ port }}']\n",
    );

    let ctx = VariableContext::new().with("replicas", 2).with("port", 8080);
    let report = fx
        .run("j2", &ctx, ConfirmPolicy::Never, &mut Scripted::new(&[]))
        .expect("run");

    assert_eq!(report.count(&FileStatus::Written), 1);
    assert_eq!(
        fs::read_to_string(fx.out().join("app/deploy.yaml")).unwrap(),
        "spec:\n  replicas: 2\n  args:\n    - \"--port\"\n    - '8080'\n"
    );
}

#[test]
fn second_run_reports_everything_unchanged() {
    let fx = Fixture::new();
    fx.template("a.yaml.j2", "a: {{ v }}\n");
    fx.template("nested/b.yaml.j2", "b:\n- {{ v }}\n");
    let ctx = VariableContext::new().with("v", "x");

    let first = fx
        .run("j2", &ctx, ConfirmPolicy::Never, &mut Scripted::new(&[]))
        .expect("first");
    assert_eq!(first.count(&FileStatus::Written), 2);

    let mut confirmer = Scripted::new(&[Confirmation::Approved, Confirmation::Approved]);
    let second = fx
        .run("j2", &ctx, ConfirmPolicy::Always, &mut confirmer)
        .expect("second");
    assert_eq!(second.count(&FileStatus::Unchanged), 2);
    assert!(confirmer.seen.is_empty(), "unchanged files are never reviewed");
}

#[test]
fn unparsed_output_is_skipped_with_its_reason() {
    let fx = Fixture::new();
    fx.template("comments.yaml.j2", "# {{ v }} only\n");
    fx.template("broken.yaml.j2", "key: [{{ v }}\n");
    fx.template("ok.yaml.j2", "key: {{ v }}\n");
    let ctx = VariableContext::new().with("v", "x");

    let report = fx
        .run("j2", &ctx, ConfirmPolicy::Never, &mut Scripted::new(&[]))
        .expect("run");

    let status_of = |name: &str| {
        report
            .outcomes
            .iter()
            .find(|o| o.path.ends_with(name))
            .map(|o| o.status.clone())
            .expect("outcome")
    };
    assert_eq!(
        status_of("comments.yaml"),
        FileStatus::SkippedUnparsed(UnparsedReason::Empty)
    );
    assert!(matches!(
        status_of("broken.yaml"),
        FileStatus::SkippedUnparsed(UnparsedReason::Invalid(_))
    ));
    assert_eq!(status_of("ok.yaml"), FileStatus::Written);
    assert!(!fx.out().join("comments.yaml").exists());
    assert!(!fx.out().join("broken.yaml").exists());
}

#[test]
fn interrupt_stops_the_remaining_run() {
    let fx = Fixture::new();
    fx.template("a.yaml.j2", "a: 1\n");
    fx.template("b.yaml.j2", "b: 1\n");
    fx.template("c.yaml.j2", "c: 1\n");

    let mut confirmer = Scripted::new(&[Confirmation::Approved, Confirmation::Interrupted]);
    let report = fx
        .run("j2", &VariableContext::new(), ConfirmPolicy::Always, &mut confirmer)
        .expect("run");

    assert!(report.is_aborted());
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].status, FileStatus::Written);
    assert_eq!(report.outcomes[1].status, FileStatus::Aborted);
    assert!(fx.out().join("a.yaml").exists());
    assert!(!fx.out().join("b.yaml").exists());
    assert!(!fx.out().join("c.yaml").exists());
}

#[test]
fn existing_files_are_reviewed_with_a_diff_under_if_exists() {
    let fx = Fixture::new();
    fx.template("a.yaml.j2", "a: 2\n");
    fx.template("b.yaml.j2", "b: 2\n");
    write(&fx.out(), "a.yaml", "a: 1\n");

    let mut confirmer = Scripted::new(&[Confirmation::Declined]);
    let report = fx
        .run("j2", &VariableContext::new(), ConfirmPolicy::IfExists, &mut confirmer)
        .expect("run");

    assert_eq!(confirmer.seen, vec![(fx.out().join("a.yaml"), true)]);
    assert_eq!(report.outcomes[0].status, FileStatus::Declined);
    assert_eq!(report.outcomes[1].status, FileStatus::Written);
    assert_eq!(fs::read_to_string(fx.out().join("a.yaml")).unwrap(), "a: 1\n");
}

#[test]
fn a_failed_write_does_not_stop_later_files() {
    let fx = Fixture::new();
    fx.template("a.yaml.j2", "a: 1\n");
    fx.template("b.yaml.j2", "b: 1\n");
    fs::create_dir_all(fx.out().join("a.yaml").join("occupied")).unwrap();

    let report = fx
        .run("j2", &VariableContext::new(), ConfirmPolicy::Never, &mut Scripted::new(&[]))
        .expect("run");

    assert!(matches!(report.outcomes[0].status, FileStatus::Failed(_)));
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.outcomes[1].status, FileStatus::Written);
    assert_eq!(report.outcome, RunOutcome::Completed);
}
