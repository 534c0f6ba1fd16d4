use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fluxit_core::{
    AppName, DeploymentStrategy, IngressType, NamespaceName, ScaffoldParams, VariableContext,
};
use fluxit_renderer::{render_templates, RenderError, Renderer, TemplateSet};
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write template");
}

fn scaffold_params() -> ScaffoldParams {
    ScaffoldParams {
        app_name: AppName::parse("echo_server").expect("app name"),
        namespace: NamespaceName::from("default"),
        ingress: IngressType::Http,
        ingress_host: Some("echo-server".to_string()),
        image_repo: "ghcr.io/acme/echo".to_string(),
        image_tag: "v1".to_string(),
        deployment_strategy: DeploymentStrategy::RollingUpdate,
        replicas: 3,
        service_port: 8080,
        include_cm: false,
        include_secret: true,
    }
}

#[test]
fn sentinel_template_is_omitted_and_value_is_substituted() {
    let tmp = TempDir::new().expect("tmp");
    write(tmp.path(), "a.tmpl", "key: {{v}}\n");
    write(tmp.path(), "b.tmpl", "__SKIP__");

    let ctx = VariableContext::new().with("v", "x");
    let out = render_templates(tmp.path(), "tmpl", &ctx).expect("render");

    let expected: BTreeMap<PathBuf, String> =
        [(PathBuf::from("a"), "key: x\n".to_string())].into_iter().collect();
    assert_eq!(out, expected);
}

#[test]
fn sentinel_surrounded_by_whitespace_still_skips() {
    let tmp = TempDir::new().expect("tmp");
    write(
        tmp.path(),
        "configmap.yaml.j2",
        "{% if include_cm %}kind: ConfigMap\n{% else %}\n   __SKIP__  \n{% endif %}",
    );

    let skip = VariableContext::new().with("include_cm", false);
    assert!(render_templates(tmp.path(), "j2", &skip).expect("render").is_empty());

    let keep = VariableContext::new().with("include_cm", true);
    let out = render_templates(tmp.path(), "j2", &keep).expect("render");
    assert_eq!(out[Path::new("configmap.yaml")], "kind: ConfigMap\n");
}

#[test]
fn sentinel_must_be_the_whole_output() {
    let tmp = TempDir::new().expect("tmp");
    write(tmp.path(), "notes.yaml.j2", "reason: __SKIP__\n");

    let out = render_templates(tmp.path(), "j2", &VariableContext::new()).expect("render");
    assert_eq!(out.len(), 1);
}

#[test]
fn undefined_variable_aborts_the_whole_render() {
    let tmp = TempDir::new().expect("tmp");
    write(tmp.path(), "a.yaml.j2", "name: {{ app_name }}\n");
    write(tmp.path(), "z/b.yaml.j2", "image: {{ image_repo }}\n");

    let set = TemplateSet::discover(tmp.path(), "j2").expect("discover");
    let renderer = Renderer::new(set).expect("load");
    let ctx = VariableContext::new().with("app_name", "demo");

    let err = renderer.render(&ctx).expect_err("undefined variable must be fatal");
    match &err {
        RenderError::UndefinedVariable { template, variable } => {
            assert_eq!(template, &PathBuf::from("z/b.yaml.j2"));
            assert_eq!(variable, "image_repo");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("z/b.yaml.j2"), "message must name the template: {message}");
    assert!(message.contains("image_repo"), "message must name the variable: {message}");
}

#[test]
fn syntax_error_is_fatal_before_rendering() {
    let tmp = TempDir::new().expect("tmp");
    write(tmp.path(), "ok.yaml.j2", "a: 1\n");
    write(tmp.path(), "broken.yaml.j2", "a: {{ unterminated\n");

    let set = TemplateSet::discover(tmp.path(), "j2").expect("discover");
    assert!(Renderer::new(set).is_err());
}

#[test]
fn directory_structure_is_preserved() {
    let tmp = TempDir::new().expect("tmp");
    write(tmp.path(), "kustomization.yaml.j2", "resources:\n  - ./app\n");
    write(tmp.path(), "app/deployment.yaml.j2", "name: {{ app_name }}\n");
    write(tmp.path(), "app/config/values.yaml.j2", "port: {{ service_port }}\n");

    let out = render_templates(tmp.path(), "j2", &scaffold_params().to_context()).expect("render");
    let paths: Vec<_> = out.keys().cloned().collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("app/config/values.yaml"),
            PathBuf::from("app/deployment.yaml"),
            PathBuf::from("kustomization.yaml"),
        ]
    );
    assert_eq!(out[Path::new("app/config/values.yaml")], "port: 8080\n");
}

#[test]
fn scaffold_context_drives_realistic_templates() {
    let tmp = TempDir::new().expect("tmp");
    write(
        tmp.path(),
        "app/helmrelease.yaml.j2",
        concat!(
            "apiVersion: apps/v1\n",
            "kind: Deployment\n",
            "metadata:\n",
            "  name: {{ app_name }}\n",
            "  namespace: {{ namespace }}\n",
            "spec:\n",
            "  replicas: {{ replicas }}\n",
            "  strategy:\n",
            "    type: {{ deployment_strategy }}\n",
            "  template:\n",
            "    spec:\n",
            "      containers:\n",
            "        - image: \"{{ image_repo }}:{{ image_tag }}\"\n",
            "{% if ingress_type != \"disabled\" %}",
            "---\n",
            "kind: Ingress\n",
            "host: {{ ingress_host }}\n",
            "{% endif %}",
        ),
    );
    write(
        tmp.path(),
        "app/secret.sops.yaml.j2",
        "{% if include_secret %}kind: Secret\n{% else %}__SKIP__{% endif %}",
    );

    let out = render_templates(tmp.path(), "j2", &scaffold_params().to_context()).expect("render");
    let release = &out[Path::new("app/helmrelease.yaml")];
    assert!(release.contains("name: echo_server\n"));
    assert!(release.contains("replicas: 3\n"));
    assert!(release.contains("type: RollingUpdate\n"));
    assert!(release.contains("image: \"ghcr.io/acme/echo:v1\"\n"));
    assert!(release.contains("host: echo-server\n"));
    assert_eq!(out[Path::new("app/secret.sops.yaml")], "kind: Secret\n");
}

#[test]
fn rendering_twice_is_identical() {
    let tmp = TempDir::new().expect("tmp");
    write(tmp.path(), "a.yaml.j2", "name: {{ app_name }}\nport: {{ service_port }}\n");
    let ctx = scaffold_params().to_context();

    let first = render_templates(tmp.path(), "j2", &ctx).expect("first");
    let second = render_templates(tmp.path(), "j2", &ctx).expect("second");
    assert_eq!(first, second);
}

#[test]
fn misspelled_condition_variable_is_fatal() {
    let tmp = TempDir::new().expect("tmp");
    write(
        tmp.path(),
        "x.yaml.j2",
        "{% if incude_cm %}kind: ConfigMap\n{% else %}__SKIP__{% endif %}",
    );

    let ctx = VariableContext::new().with("include_cm", true);
    let err = render_templates(tmp.path(), "j2", &ctx).expect_err("misspelled flag must fail");
    match err {
        RenderError::UndefinedVariable { template, variable } => {
            assert_eq!(template, PathBuf::from("x.yaml.j2"));
            assert_eq!(variable, "incude_cm");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn elif_condition_is_checked_too() {
    let tmp = TempDir::new().expect("tmp");
    write(
        tmp.path(),
        "ingress.yaml.j2",
        "{% if ingress_type == \"http\" %}kind: Ingress\n{% elif use_gateway %}kind: HTTPRoute\n{% endif %}",
    );

    let ctx = VariableContext::new().with("ingress_type", "http");
    let err = render_templates(tmp.path(), "j2", &ctx).expect_err("undefined elif name");
    assert!(matches!(
        err,
        RenderError::UndefinedVariable { ref variable, .. } if variable == "use_gateway"
    ));
}

#[test]
fn guarded_and_locally_bound_condition_names_render() {
    let tmp = TempDir::new().expect("tmp");
    write(
        tmp.path(),
        "svc.yaml.j2",
        concat!(
            "{% if team is defined %}team: {{ team }}\n{% endif %}",
            "{% if debug | default(value=false) %}debug: true\n{% endif %}",
            "{% for p in ports %}{% if p.public %}port: {{ p.number }}\n{% endif %}{% endfor %}",
        ),
    );

    let ports = serde_json::json!([
        {"number": 80, "public": true},
        {"number": 9090, "public": false},
    ]);
    let ctx = VariableContext::new().with("ports", ports);
    let out = render_templates(tmp.path(), "j2", &ctx).expect("render");
    assert_eq!(out[Path::new("svc.yaml")], "port: 80\n");
}
