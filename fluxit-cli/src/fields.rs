//! Scaffold options and their prompt configuration.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use fluxit_core::{
    defaults, namespaces, validate, AppName, DeploymentStrategy, IngressType, NamespaceName,
    ScaffoldParams,
};

use crate::prompt::{resolve_field, FieldPrompt, PromptKind, Prompter};

/// Values that end up in the template context.
#[derive(Args, Debug, Clone)]
pub struct FieldArgs {
    /// Namespace where the deployment scaffold will be created.
    #[arg(long, env = "FLUXIT_NS")]
    pub ns: Option<String>,

    /// Name of the application.
    #[arg(long, env = "FLUXIT_APP_NAME")]
    pub app_name: Option<String>,

    /// Ingress type to be used by the app (disabled, http).
    #[arg(long, env = "FLUXIT_INGRESS")]
    pub ingress: Option<String>,

    /// Hostname for the ingress resources.
    #[arg(long, env = "FLUXIT_INGRESS_HOST")]
    pub ingress_host: Option<String>,

    /// Container image repository.
    #[arg(long, env = "FLUXIT_IMAGE_REPO")]
    pub image_repo: Option<String>,

    /// Container image tag.
    #[arg(long, env = "FLUXIT_IMAGE_TAG")]
    pub image_tag: Option<String>,

    /// Pod deployment strategy (RollingUpdate, Recreate).
    #[arg(long, env = "FLUXIT_DEPLOYMENT_STRATEGY", default_value_t = defaults::DEPLOYMENT_STRATEGY)]
    pub deployment_strategy: DeploymentStrategy,

    /// Number of replicas for the deployment.
    #[arg(long, env = "FLUXIT_REPLICAS", default_value_t = defaults::REPLICAS)]
    pub replicas: u32,

    /// Port exposed by the service.
    #[arg(long, env = "FLUXIT_SERVICE_PORT", default_value_t = defaults::SERVICE_PORT)]
    pub service_port: u16,

    /// Include a ConfigMap template.
    #[arg(long, overrides_with = "no_include_cm")]
    pub include_cm: bool,

    #[arg(long, overrides_with = "include_cm", hide = true)]
    pub no_include_cm: bool,

    /// Include a Secret template.
    #[arg(long, overrides_with = "no_include_secret")]
    pub include_secret: bool,

    #[arg(long, overrides_with = "include_secret", hide = true)]
    pub no_include_secret: bool,
}

fn flag(yes: bool, no: bool) -> Option<String> {
    match (yes, no) {
        (true, _) => Some("true".to_string()),
        (_, true) => Some("false".to_string()),
        _ => None,
    }
}

fn ingress_choice(raw: &str) -> Result<String, String> {
    raw.parse::<IngressType>()
        .map(|i| i.to_string())
        .map_err(|e| e.to_string())
}

fn boolean(raw: &str) -> Result<String, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" => Ok("true".to_string()),
        "false" | "no" | "n" => Ok("false".to_string()),
        other => Err(format!("'{other}' is not a yes/no answer.")),
    }
}

fn confirm_field(name: &'static str, message: &str) -> FieldPrompt {
    FieldPrompt::new(name, PromptKind::Confirm, message)
        .default("false")
        .prompt_with_default()
        .validate(boolean)
}

impl FieldArgs {
    /// Resolve every scaffold value, prompting where allowed.
    ///
    /// Namespaces are only discovered under `k8s_app_dir` when the operator
    /// has to pick one.
    pub fn resolve(&self, k8s_app_dir: &Path, prompter: &mut dyn Prompter) -> Result<ScaffoldParams> {
        let mut ns_field = FieldPrompt::new("ns", PromptKind::FuzzySelect, "Namespace:");
        if self.ns.is_none() && prompter.is_interactive() {
            let found = namespaces::discover(k8s_app_dir).context("error fetching namespaces")?;
            if found.is_empty() {
                bail!("No namespaces found in {}.", k8s_app_dir.display());
            }
            ns_field = ns_field.choices(found.into_keys().map(|n| n.0));
        }
        let namespace = resolve_field(self.ns.clone(), &ns_field, prompter)?;

        let app_name = resolve_field(
            self.app_name.clone(),
            &FieldPrompt::new("app-name", PromptKind::Text, "Application name:")
                .validate(validate::app_name),
            prompter,
        )?;
        let app_name = AppName::parse(&app_name)?;

        let ingress = resolve_field(
            self.ingress.clone(),
            &FieldPrompt::new("ingress", PromptKind::Select, "Ingress type:")
                .choices(IngressType::all().iter().map(ToString::to_string))
                .validate(ingress_choice),
            prompter,
        )?;
        let ingress: IngressType = ingress.parse()?;

        let ingress_host = if ingress.is_enabled() {
            let field = FieldPrompt::new("ingress-host", PromptKind::Text, "App Ingress Hostname:")
                .default(app_name.default_ingress_host())
                .prompt_with_default()
                .validate(validate::ingress_host);
            Some(resolve_field(self.ingress_host.clone(), &field, prompter)?)
        } else {
            self.ingress_host.clone()
        };

        let image_repo = resolve_field(
            self.image_repo.clone(),
            &FieldPrompt::new("image-repo", PromptKind::Text, "Container Image repository:")
                .validate(validate::non_empty),
            prompter,
        )?;
        let image_tag = resolve_field(
            self.image_tag.clone(),
            &FieldPrompt::new("image-tag", PromptKind::Text, "Container Image Tag:")
                .validate(validate::non_empty),
            prompter,
        )?;

        let include_cm = resolve_field(
            flag(self.include_cm, self.no_include_cm),
            &confirm_field("include-cm", "Include a ConfigMap template?"),
            prompter,
        )? == "true";
        let include_secret = resolve_field(
            flag(self.include_secret, self.no_include_secret),
            &confirm_field("include-secret", "Include a Secret template?"),
            prompter,
        )? == "true";

        Ok(ScaffoldParams {
            app_name,
            namespace: NamespaceName::from(namespace),
            ingress,
            ingress_host,
            image_repo,
            image_tag,
            deployment_strategy: self.deployment_strategy,
            replicas: self.replicas,
            service_port: self.service_port,
            include_cm,
            include_secret,
        })
    }
}
