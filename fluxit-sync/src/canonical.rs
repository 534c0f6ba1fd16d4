//! YAML validation and canonical re-serialization of rendered output.
//!
//! [`canonicalize`] never fails: text that is not meaningful YAML comes back
//! untouched as [`CanonicalDocument::Unstructured`], tagged with why.

use serde::Deserialize;
use serde_yaml::Value;

use crate::emitter;

/// Why rendered text was not accepted as structured data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnparsedReason {
    /// Parsed, but every document was null or empty (comments, bare `---`).
    Empty,
    /// The parser rejected the text.
    Invalid(String),
}

/// Result of canonicalizing one rendered artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalDocument {
    /// Valid, non-empty YAML: the parsed documents plus their canonical text.
    Structured {
        documents: Vec<Value>,
        canonical: String,
    },
    /// Anything else; `original` is the input, unchanged.
    Unstructured {
        original: String,
        reason: UnparsedReason,
    },
}

impl CanonicalDocument {
    pub fn is_structured(&self) -> bool {
        matches!(self, CanonicalDocument::Structured { .. })
    }

    /// Canonical text when structured, the original text otherwise.
    pub fn text(&self) -> &str {
        match self {
            CanonicalDocument::Structured { canonical, .. } => canonical,
            CanonicalDocument::Unstructured { original, .. } => original,
        }
    }
}

/// Parse `content` as a (multi-document) YAML stream and re-serialize it.
pub fn canonicalize(content: &str) -> CanonicalDocument {
    let unstructured = |reason| CanonicalDocument::Unstructured {
        original: content.to_string(),
        reason,
    };

    let documents = match parse_documents(content) {
        Ok(documents) => documents,
        Err(e) => {
            tracing::warn!("could not parse content as YAML, proceeding with raw content: {e}");
            return unstructured(UnparsedReason::Invalid(e.to_string()));
        }
    };

    if documents.iter().all(is_empty_document) {
        tracing::debug!("YAML content resulted in empty documents after parsing");
        return unstructured(UnparsedReason::Empty);
    }

    match emitter::canonical_text(content) {
        Ok(canonical) => CanonicalDocument::Structured {
            documents,
            canonical,
        },
        Err(e) => {
            tracing::warn!("could not parse content as YAML, proceeding with raw content: {e}");
            unstructured(UnparsedReason::Invalid(e.to_string()))
        }
    }
}

fn parse_documents(content: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    serde_yaml::Deserializer::from_str(content)
        .map(Value::deserialize)
        .collect()
}

fn is_empty_document(doc: &Value) -> bool {
    match doc {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(items) => items.is_empty(),
        Value::Mapping(entries) => entries.is_empty(),
        _ => false,
    }
}
