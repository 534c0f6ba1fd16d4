//! Template discovery and the Tera rendering engine.
//!
//! # Path mapping
//!
//! | Template (relative to base) | Output (relative to output root) |
//! |-----------------------------|----------------------------------|
//! | `app/deployment.yaml.j2`    | `app/deployment.yaml`            |
//! | `kustomization.yaml.j2`     | `kustomization.yaml`             |
//!
//! A template whose trimmed output is exactly `__SKIP__` produces no output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use fluxit_core::defaults::SKIP_SENTINEL;
use fluxit_core::VariableContext;

use crate::conditions::free_condition_names;
use crate::context::{to_tera_context, undefined_variable};
use crate::error::{io_err, RenderError};

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn collect_template_files(
    dir: &Path,
    extension: &str,
    out: &mut Vec<PathBuf>,
) -> Result<(), RenderError> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| io_err(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        // Linked directories are not descended into, so a cycle cannot loop.
        // Linked files still count.
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        let is_file = if file_type.is_symlink() {
            std::fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
        } else {
            file_type.is_file()
        };
        if file_type.is_dir() {
            collect_template_files(&path, extension, out)?;
        } else if is_file && path.extension().and_then(|s| s.to_str()) == Some(extension) {
            out.push(path);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TemplateSet
// ---------------------------------------------------------------------------

/// Ordered set of template files rooted at a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    base: PathBuf,
    extension: String,
    templates: Vec<PathBuf>,
}

impl TemplateSet {
    /// Recursively find every file under `base` whose extension is `extension`
    /// (given without the dot). Paths are stored relative to `base`.
    pub fn discover(base: &Path, extension: &str) -> Result<Self, RenderError> {
        if !base.is_dir() {
            return Err(RenderError::TemplateDirMissing {
                path: base.to_path_buf(),
            });
        }
        let extension = extension.trim_start_matches('.').to_string();
        let mut files = Vec::new();
        collect_template_files(base, &extension, &mut files)?;

        let templates = files
            .into_iter()
            .map(|path| {
                path.strip_prefix(base)
                    .map(Path::to_path_buf)
                    .unwrap_or(path)
            })
            .collect::<Vec<_>>();
        tracing::debug!("discovered {} template(s) under {}", templates.len(), base.display());

        Ok(TemplateSet {
            base: base.to_path_buf(),
            extension,
            templates,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Template paths relative to [`TemplateSet::base`], in discovery order.
    pub fn templates(&self) -> &[PathBuf] {
        &self.templates
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Output path for a template: the same relative path minus the marker
    /// extension.
    pub fn output_path(template: &Path) -> PathBuf {
        template.with_extension("")
    }
}

// ---------------------------------------------------------------------------
// RenderedArtifact
// ---------------------------------------------------------------------------

/// One rendered template, ready for canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Template path relative to the template base.
    pub template: PathBuf,
    /// Output path relative to the output root.
    pub output_path: PathBuf,
    /// Rendered text.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Tera engine loaded with every template of a [`TemplateSet`].
///
/// Templates may `include`, `import` or `extend` each other by their relative
/// path (always `/`-separated).
///
/// Tera reads an unknown name in an `if` condition as false. Every name a
/// condition reads must therefore be present in the context, unless the
/// template binds it itself or guards it with `is defined`.
pub struct Renderer {
    tera: Tera,
    set: TemplateSet,
    /// Free condition names per template, aligned with `set.templates`.
    conditions: Vec<Vec<String>>,
}

impl Renderer {
    /// Load and parse every template of `set`.
    pub fn new(set: TemplateSet) -> Result<Self, RenderError> {
        let mut sources = Vec::with_capacity(set.templates.len());
        for rel in &set.templates {
            let path = set.base.join(rel);
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            sources.push((template_name(rel), contents));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_templates(sources)?;

        let conditions = set
            .templates
            .iter()
            .map(|rel| {
                tera.get_template(&template_name(rel))
                    .map(|template| free_condition_names(&template.ast))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Renderer {
            tera,
            set,
            conditions,
        })
    }

    pub fn template_set(&self) -> &TemplateSet {
        &self.set
    }

    /// Render every template against `ctx`.
    ///
    /// Fails closed: the first template that cannot be rendered aborts the
    /// whole call and nothing is returned. Templates rendering to the skip
    /// sentinel are left out of the result.
    pub fn render(&self, ctx: &VariableContext) -> Result<Vec<RenderedArtifact>, RenderError> {
        let tera_ctx = to_tera_context(ctx)?;
        let mut rendered = Vec::with_capacity(self.set.templates.len());

        for (rel, names) in self.set.templates.iter().zip(&self.conditions) {
            if let Some(variable) = names.iter().find(|name| !ctx.contains(name)) {
                return Err(RenderError::UndefinedVariable {
                    template: rel.clone(),
                    variable: variable.clone(),
                });
            }

            let content = self
                .tera
                .render(&template_name(rel), &tera_ctx)
                .map_err(|source| match undefined_variable(&source) {
                    Some(variable) => RenderError::UndefinedVariable {
                        template: rel.clone(),
                        variable,
                    },
                    None => RenderError::Template {
                        template: rel.clone(),
                        source,
                    },
                })?;

            if content.trim() == SKIP_SENTINEL {
                tracing::debug!("skip sentinel: {}", rel.display());
                continue;
            }

            rendered.push(RenderedArtifact {
                template: rel.clone(),
                output_path: TemplateSet::output_path(rel),
                content,
            });
        }
        Ok(rendered)
    }
}

/// Discover, load and render in one call.
///
/// Returns output path → rendered text for every template that produced
/// output.
pub fn render_templates(
    base: &Path,
    extension: &str,
    ctx: &VariableContext,
) -> Result<BTreeMap<PathBuf, String>, RenderError> {
    let renderer = Renderer::new(TemplateSet::discover(base, extension)?)?;
    Ok(renderer
        .render(ctx)?
        .into_iter()
        .map(|a| (a.output_path, a.content))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn output_path_strips_only_the_marker_extension() {
        assert_eq!(
            TemplateSet::output_path(Path::new("app/deployment.yaml.j2")),
            PathBuf::from("app/deployment.yaml")
        );
        assert_eq!(TemplateSet::output_path(Path::new("a.tmpl")), PathBuf::from("a"));
    }

    #[test]
    fn discovery_is_relative_to_base_and_filtered_by_extension() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.yaml.j2", "b");
        write(tmp.path(), "nested/a.yaml.j2", "a");
        write(tmp.path(), "README.md", "docs");
        write(tmp.path(), "nested/notes.txt", "x");

        let set = TemplateSet::discover(tmp.path(), "j2").unwrap();
        assert_eq!(
            set.templates(),
            &[PathBuf::from("b.yaml.j2"), PathBuf::from("nested/a.yaml.j2")]
        );
    }

    #[test]
    fn leading_dot_in_extension_is_ignored() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.tmpl", "a");
        let set = TemplateSet::discover(tmp.path(), ".tmpl").unwrap();
        assert_eq!(set.extension(), "tmpl");
        assert_eq!(set.templates().len(), 1);
    }

    #[test]
    fn missing_base_is_reported() {
        let tmp = TempDir::new().unwrap();
        let err = TemplateSet::discover(&tmp.path().join("absent"), "j2").unwrap_err();
        assert!(matches!(err, RenderError::TemplateDirMissing { .. }));
    }

    #[test]
    fn templates_can_include_each_other() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "labels.yaml.j2", "app: {{ app_name }}\n");
        write(
            tmp.path(),
            "svc.yaml.j2",
            "metadata:\n  labels:\n    {% include \"labels.yaml.j2\" %}",
        );

        let ctx = VariableContext::new().with("app_name", "demo");
        let out = render_templates(tmp.path(), "j2", &ctx).unwrap();
        assert_eq!(out[Path::new("labels.yaml")], "app: demo\n");
        assert_eq!(out[Path::new("svc.yaml")], "metadata:\n  labels:\n    app: demo\n");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_cycle_does_not_break_discovery() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "app/deploy.yaml.j2", "a");
        std::os::unix::fs::symlink(tmp.path(), tmp.path().join("app/loop")).unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("app/deploy.yaml.j2"),
            tmp.path().join("linked.yaml.j2"),
        )
        .unwrap();

        let set = TemplateSet::discover(tmp.path(), "j2").unwrap();
        assert_eq!(
            set.templates(),
            &[PathBuf::from("app/deploy.yaml.j2"), PathBuf::from("linked.yaml.j2")]
        );
    }

    #[test]
    fn html_named_templates_are_not_escaped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "page.html.j2", "{{ v }}");
        let out =
            render_templates(tmp.path(), "j2", &VariableContext::new().with("v", "<b>&</b>")).unwrap();
        assert_eq!(out[Path::new("page.html")], "<b>&</b>");
    }
}
