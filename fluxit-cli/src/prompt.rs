//! Data-driven field prompts.
//!
//! Each option that may be asked for interactively is described by a
//! [`FieldPrompt`]; [`resolve_field`] turns a CLI value, a default and the
//! operator's answers into one accepted value.

use std::fmt;
use std::io::ErrorKind;

use anyhow::{anyhow, bail, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect, Input, Select};

/// Normalises an answer, or returns a message explaining the rejection.
pub type Validator = fn(&str) -> std::result::Result<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    Select,
    FuzzySelect,
    Confirm,
}

/// How a single option is asked for when the command line leaves it out.
#[derive(Debug, Clone)]
pub struct FieldPrompt {
    /// Option name without dashes, e.g. `app-name`.
    pub name: &'static str,
    pub kind: PromptKind,
    pub message: String,
    pub default: Option<String>,
    pub choices: Vec<String>,
    pub validate: Option<Validator>,
    /// Ask even though a default exists; the default is pre-filled.
    pub prompt_with_default: bool,
    /// Ask when there is neither a CLI value nor a default.
    pub prompt_when_missing: bool,
}

impl FieldPrompt {
    pub fn new(name: &'static str, kind: PromptKind, message: impl Into<String>) -> Self {
        FieldPrompt {
            name,
            kind,
            message: message.into(),
            default: None,
            choices: Vec::new(),
            validate: None,
            prompt_with_default: false,
            prompt_when_missing: true,
        }
    }

    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }

    pub fn prompt_with_default(mut self) -> Self {
        self.prompt_with_default = true;
        self
    }

    fn check(&self, raw: &str) -> std::result::Result<String, String> {
        match self.validate {
            Some(validator) => validator(raw),
            None => Ok(raw.to_string()),
        }
    }
}

/// Source of interactive answers.
pub trait Prompter {
    fn is_interactive(&self) -> bool;

    /// Ask for one value. Confirm prompts answer `"true"` or `"false"`.
    fn ask(&mut self, field: &FieldPrompt) -> Result<String>;

    /// Tell the operator why the last answer was not accepted.
    fn reject(&mut self, message: &str);
}

/// The operator pressed Ctrl-C or Esc at a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user interrupted")
    }
}

impl std::error::Error for Interrupted {}

/// Resolve one field.
///
/// 1. A CLI (or environment) value always wins, after validation.
/// 2. Otherwise a default wins unless the field asks to prompt over it.
/// 3. Otherwise, when interactive, ask until the validator accepts.
/// 4. Otherwise the field is missing.
pub fn resolve_field(
    cli_value: Option<String>,
    field: &FieldPrompt,
    prompter: &mut dyn Prompter,
) -> Result<String> {
    if let Some(raw) = cli_value {
        return field
            .check(&raw)
            .map_err(|msg| anyhow!("invalid value for --{}: {msg}", field.name));
    }

    let interactive = prompter.is_interactive();
    match &field.default {
        Some(default) if !field.prompt_with_default || !interactive => {
            return Ok(default.clone());
        }
        None if !field.prompt_when_missing || !interactive => {
            bail!("missing value for --{}", field.name);
        }
        _ => {}
    }

    loop {
        let answer = prompter.ask(field)?;
        match field.check(&answer) {
            Ok(value) => return Ok(value),
            Err(msg) => prompter.reject(&msg),
        }
    }
}

// ---------------------------------------------------------------------------
// dialoguer
// ---------------------------------------------------------------------------

/// Terminal prompts backed by `dialoguer`.
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
    interactive: bool,
}

impl DialoguerPrompter {
    pub fn new(interactive: bool) -> Self {
        DialoguerPrompter {
            theme: ColorfulTheme::default(),
            interactive,
        }
    }
}

impl Prompter for DialoguerPrompter {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn ask(&mut self, field: &FieldPrompt) -> Result<String> {
        let default_index = field
            .default
            .as_ref()
            .and_then(|d| field.choices.iter().position(|c| c == d))
            .unwrap_or(0);

        let answer = match field.kind {
            PromptKind::Text => {
                let mut input = Input::<String>::with_theme(&self.theme)
                    .with_prompt(field.message.as_str())
                    .allow_empty(true);
                if let Some(default) = &field.default {
                    input = input.default(default.clone());
                }
                input.interact_text()
            }
            PromptKind::Select => Select::with_theme(&self.theme)
                .with_prompt(field.message.as_str())
                .items(&field.choices)
                .default(default_index)
                .interact()
                .map(|i| field.choices[i].clone()),
            PromptKind::FuzzySelect => FuzzySelect::with_theme(&self.theme)
                .with_prompt(field.message.as_str())
                .items(&field.choices)
                .default(default_index)
                .interact()
                .map(|i| field.choices[i].clone()),
            PromptKind::Confirm => {
                let default = field.default.as_deref() == Some("true");
                Confirm::with_theme(&self.theme)
                    .with_prompt(field.message.as_str())
                    .default(default)
                    .interact()
                    .map(|b| b.to_string())
            }
        };
        answer.map_err(prompt_error)
    }

    fn reject(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

pub(crate) fn is_interrupt(err: &dialoguer::Error) -> bool {
    matches!(err, dialoguer::Error::IO(io) if io.kind() == ErrorKind::Interrupted)
}

fn prompt_error(err: dialoguer::Error) -> anyhow::Error {
    if is_interrupt(&err) {
        Interrupted.into()
    } else {
        anyhow::Error::new(err).context("prompt failed")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fluxit_core::validate;

    /// Replays canned answers and records what was asked.
    pub(crate) struct Scripted {
        pub interactive: bool,
        pub answers: Vec<String>,
        pub asked: Vec<&'static str>,
        pub rejections: Vec<String>,
    }

    impl Scripted {
        pub fn new(answers: &[&str]) -> Self {
            Scripted {
                interactive: true,
                answers: answers.iter().rev().map(|s| s.to_string()).collect(),
                asked: Vec::new(),
                rejections: Vec::new(),
            }
        }

        pub fn offline() -> Self {
            Scripted {
                interactive: false,
                ..Scripted::new(&[])
            }
        }
    }

    impl Prompter for Scripted {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn ask(&mut self, field: &FieldPrompt) -> Result<String> {
            self.asked.push(field.name);
            self.answers
                .pop()
                .ok_or_else(|| anyhow!("no scripted answer for {}", field.name))
        }

        fn reject(&mut self, message: &str) {
            self.rejections.push(message.to_string());
        }
    }

    fn app_name_field() -> FieldPrompt {
        FieldPrompt::new("app-name", PromptKind::Text, "Application name:")
            .validate(validate::app_name)
    }

    #[test]
    fn cli_value_wins_and_is_normalised() {
        let mut p = Scripted::new(&["ignored"]);
        let v = resolve_field(Some(" Echo_Server ".into()), &app_name_field(), &mut p).unwrap();
        assert_eq!(v, "echo_server");
        assert!(p.asked.is_empty());
    }

    #[test]
    fn invalid_cli_value_is_an_error_naming_the_option() {
        let mut p = Scripted::new(&[]);
        let err = resolve_field(Some("bad name!".into()), &app_name_field(), &mut p).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("--app-name"), "{msg}");
        assert!(msg.contains("Only letters"), "{msg}");
    }

    #[test]
    fn default_wins_without_prompting() {
        let field = FieldPrompt::new("replicas", PromptKind::Text, "Replicas:").default("1");
        let mut p = Scripted::new(&["5"]);
        assert_eq!(resolve_field(None, &field, &mut p).unwrap(), "1");
        assert!(p.asked.is_empty());
    }

    #[test]
    fn prompt_with_default_asks_when_interactive() {
        let field = FieldPrompt::new("ingress-host", PromptKind::Text, "Host:")
            .default("echo-server")
            .prompt_with_default();
        let mut p = Scripted::new(&["custom"]);
        assert_eq!(resolve_field(None, &field, &mut p).unwrap(), "custom");

        let mut offline = Scripted::offline();
        assert_eq!(resolve_field(None, &field, &mut offline).unwrap(), "echo-server");
    }

    #[test]
    fn invalid_answers_are_rejected_until_one_passes() {
        let mut p = Scripted::new(&["no spaces allowed", "Echo"]);
        let v = resolve_field(None, &app_name_field(), &mut p).unwrap();
        assert_eq!(v, "echo");
        assert_eq!(p.asked, vec!["app-name", "app-name"]);
        assert_eq!(
            p.rejections,
            vec!["Only letters, numbers, dash and underscore are allowed."]
        );
    }

    #[test]
    fn missing_value_without_terminal_is_an_error() {
        let mut p = Scripted::offline();
        let err = resolve_field(None, &app_name_field(), &mut p).unwrap_err();
        assert_eq!(err.to_string(), "missing value for --app-name");
    }

    #[test]
    fn prompt_when_missing_off_never_asks() {
        let mut field = app_name_field();
        field.prompt_when_missing = false;
        let mut p = Scripted::new(&["echo"]);
        assert!(resolve_field(None, &field, &mut p).is_err());
        assert!(p.asked.is_empty());
    }

    #[test]
    fn interrupt_is_recognisable() {
        let io = std::io::Error::new(ErrorKind::Interrupted, "read interrupted");
        let err = prompt_error(dialoguer::Error::IO(io));
        assert!(err.is::<Interrupted>());

        let other = std::io::Error::new(ErrorKind::Other, "boom");
        assert!(!prompt_error(dialoguer::Error::IO(other)).is::<Interrupted>());
    }
}
