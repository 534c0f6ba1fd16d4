//! Conversion of a [`VariableContext`] into a [`tera::Context`].

use fluxit_core::VariableContext;

use crate::error::RenderError;

/// Convert to a [`tera::Context`] for rendering.
///
/// The context serializes as a flat map, so every variable becomes a
/// top-level template name.
pub fn to_tera_context(ctx: &VariableContext) -> Result<tera::Context, RenderError> {
    tera::Context::from_serialize(ctx).map_err(RenderError::from)
}

/// Pull the variable name out of a tera "not found in context" failure.
///
/// Tera nests the useful message under a generic "Failed to render" error,
/// so the whole source chain is searched.
pub(crate) fn undefined_variable(err: &tera::Error) -> Option<String> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let message = e.to_string();
        if let Some(rest) = message.strip_prefix("Variable `") {
            if let Some((name, tail)) = rest.split_once('`') {
                if tail.trim_start().starts_with("not found in context") {
                    return Some(name.to_string());
                }
            }
        }
        current = e.source();
    }
    None
}
