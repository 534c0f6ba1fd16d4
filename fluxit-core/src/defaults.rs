//! Built-in defaults for every fluxit option.

use crate::types::{ConfirmPolicy, DeploymentStrategy};

/// Directory holding one subdirectory per namespace.
pub const K8S_APP_DIR: &str = "kubernetes/apps";
/// Base directory holding template sets.
pub const TEMPLATE_DIR: &str = ".templates/fluxit";
/// Template set (subdirectory of [`TEMPLATE_DIR`]) used when none is given.
pub const TEMPLATE: &str = "app_template";
/// Marker file that identifies a namespace directory.
pub const NS_MARKER_FILE: &str = "kustomization.yaml";
/// Default log level.
pub const LOG_LEVEL: &str = "info";
/// Default confirmation policy.
pub const CONFIRM: ConfirmPolicy = ConfirmPolicy::IfExists;
/// Default pod deployment strategy.
pub const DEPLOYMENT_STRATEGY: DeploymentStrategy = DeploymentStrategy::Recreate;
/// Default replica count.
pub const REPLICAS: u32 = 1;
/// Colorized diffs unless disabled.
pub const COLOR: bool = true;
/// Default service port.
pub const SERVICE_PORT: u16 = 80;
/// File suffix (without the dot) that marks a file as a template.
pub const TEMPLATE_EXTENSION: &str = "j2";
/// Rendered output that means "emit nothing for this template".
pub const SKIP_SENTINEL: &str = "__SKIP__";
