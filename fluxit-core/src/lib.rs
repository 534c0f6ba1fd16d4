//! fluxit core library — domain types, defaults, validation, namespace discovery.
//!
//! - [`types`] — newtypes, [`VariableContext`], [`ConfirmPolicy`], [`ScaffoldParams`]
//! - [`defaults`] — built-in option defaults
//! - [`validate`] — field validators shared by the CLI prompts
//! - [`namespaces`] — scan a k8s app directory for namespace marker files
//! - [`error`] — [`CoreError`]

pub mod defaults;
pub mod error;
pub mod namespaces;
pub mod types;
pub mod validate;

pub use error::CoreError;
pub use types::{
    AppName, ConfirmPolicy, DeploymentStrategy, IngressType, NamespaceName, ScaffoldParams,
    VariableContext,
};
