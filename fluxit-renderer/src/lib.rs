//! # fluxit-renderer
//!
//! Tera-based renderer that expands a directory of template files against a
//! [`VariableContext`](fluxit_core::VariableContext).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use fluxit_core::VariableContext;
//! use fluxit_renderer::{Renderer, TemplateSet};
//!
//! fn render(base: &Path) -> Result<(), fluxit_renderer::RenderError> {
//!     let set = TemplateSet::discover(base, "j2")?;
//!     let ctx = VariableContext::new().with("app_name", "demo");
//!     for artifact in Renderer::new(set)?.render(&ctx)? {
//!         println!("{}: {} bytes", artifact.output_path.display(), artifact.content.len());
//!     }
//!     Ok(())
//! }
//! ```

mod conditions;
pub mod context;
pub mod engine;
pub mod error;

pub use engine::{render_templates, RenderedArtifact, Renderer, TemplateSet};
pub use error::RenderError;
