//! Domain types shared by the renderer, the sync pipeline and the CLI.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::validate;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A validated application name (`[a-z0-9_-]+`, lowercased).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppName(pub String);

impl AppName {
    /// Normalise and validate `raw`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        validate::app_name(raw)
            .map(Self)
            .map_err(|message| CoreError::Validation {
                field: "app-name",
                message,
            })
    }

    /// Ingress host suggestion derived from the app name (`_` → `-`).
    pub fn default_ingress_host(&self) -> String {
        self.0.replace('_', "-")
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Name of a target namespace, as read from its marker file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceName(pub String);

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for NamespaceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NamespaceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// When the operator is asked before a file is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmPolicy {
    /// Review every file before writing.
    Always,
    /// Write without review.
    Never,
    /// Review only when a file already exists at the output path.
    #[default]
    IfExists,
}

impl ConfirmPolicy {
    /// All variants in a stable order.
    pub fn all() -> &'static [ConfirmPolicy] {
        &[ConfirmPolicy::Always, ConfirmPolicy::Never, ConfirmPolicy::IfExists]
    }
}

impl fmt::Display for ConfirmPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmPolicy::Always => write!(f, "always"),
            ConfirmPolicy::Never => write!(f, "never"),
            ConfirmPolicy::IfExists => write!(f, "if-exists"),
        }
    }
}

impl FromStr for ConfirmPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "if-exists" | "if_exists" => Ok(Self::IfExists),
            other => Err(CoreError::UnknownVariant {
                kind: "confirmation policy",
                value: other.to_string(),
                expected: "always, never, if-exists",
            }),
        }
    }
}

/// Ingress flavour rendered for the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IngressType {
    #[default]
    Disabled,
    Http,
}

impl IngressType {
    pub fn all() -> &'static [IngressType] {
        &[IngressType::Disabled, IngressType::Http]
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, IngressType::Disabled)
    }
}

impl fmt::Display for IngressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngressType::Disabled => write!(f, "disabled"),
            IngressType::Http => write!(f, "http"),
        }
    }
}

impl FromStr for IngressType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "http" => Ok(Self::Http),
            other => Err(CoreError::UnknownVariant {
                kind: "ingress type",
                value: other.to_string(),
                expected: "disabled, http",
            }),
        }
    }
}

/// Kubernetes deployment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeploymentStrategy {
    RollingUpdate,
    #[default]
    Recreate,
}

impl DeploymentStrategy {
    pub fn all() -> &'static [DeploymentStrategy] {
        &[DeploymentStrategy::RollingUpdate, DeploymentStrategy::Recreate]
    }
}

impl fmt::Display for DeploymentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentStrategy::RollingUpdate => write!(f, "RollingUpdate"),
            DeploymentStrategy::Recreate => write!(f, "Recreate"),
        }
    }
}

impl FromStr for DeploymentStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rollingupdate" => Ok(Self::RollingUpdate),
            "recreate" => Ok(Self::Recreate),
            other => Err(CoreError::UnknownVariant {
                kind: "deployment strategy",
                value: other.to_string(),
                expected: "RollingUpdate, Recreate",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// VariableContext
// ---------------------------------------------------------------------------

/// Named values handed to every template of a run.
///
/// Bound once per run and never mutated while rendering. Templates that
/// reference a name missing from the context fail the whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableContext(BTreeMap<String, Value>);

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ScaffoldParams
// ---------------------------------------------------------------------------

/// Fully resolved answers for one scaffold run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldParams {
    pub app_name: AppName,
    pub namespace: NamespaceName,
    pub ingress: IngressType,
    /// `None` only when ingress is disabled.
    pub ingress_host: Option<String>,
    pub image_repo: String,
    pub image_tag: String,
    pub deployment_strategy: DeploymentStrategy,
    pub replicas: u32,
    pub service_port: u16,
    pub include_cm: bool,
    pub include_secret: bool,
}

impl ScaffoldParams {
    /// Template variables exposed by a scaffold run.
    ///
    /// `ingress_host` is always present (null when unset) so templates can
    /// test it without tripping the undefined-variable check.
    pub fn to_context(&self) -> VariableContext {
        VariableContext::new()
            .with("app_name", self.app_name.0.clone())
            .with("namespace", self.namespace.0.clone())
            .with("ingress_type", self.ingress.to_string())
            .with(
                "ingress_host",
                self.ingress_host.clone().map(Value::String).unwrap_or(Value::Null),
            )
            .with("image_repo", self.image_repo.clone())
            .with("image_tag", self.image_tag.clone())
            .with("deployment_strategy", self.deployment_strategy.to_string())
            .with("replicas", self.replicas)
            .with("service_port", self.service_port)
            .with("include_cm", self.include_cm)
            .with("include_secret", self.include_secret)
    }

    /// `<k8s_app_dir>/<namespace>/<app_name>` — pure, no I/O.
    pub fn output_root(&self, k8s_app_dir: &Path) -> PathBuf {
        k8s_app_dir.join(&self.namespace.0).join(&self.app_name.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
