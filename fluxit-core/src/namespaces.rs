//! Namespace discovery.
//!
//! # Layout
//!
//! ```text
//! <k8s_app_dir>/
//!   <dir>/
//!     kustomization.yaml   (must carry a top-level `namespace:` field)
//!     <app>/...
//! ```
//!
//! Only immediate subdirectories are inspected. The namespace name comes from
//! the marker file, not from the directory name.

use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::Value;

use crate::defaults::NS_MARKER_FILE;
use crate::error::{io_err, CoreError};
use crate::types::NamespaceName;

/// Discover namespaces under `root` using the default marker file.
pub fn discover(root: &Path) -> Result<BTreeMap<NamespaceName, Value>, CoreError> {
    discover_with_marker(root, NS_MARKER_FILE)
}

/// Map every namespace found under `root` to its parsed marker file.
///
/// Marker files that fail to parse, or that have no string `namespace`
/// field, are logged and skipped. Results are sorted by namespace name.
pub fn discover_with_marker(
    root: &Path,
    marker: &str,
) -> Result<BTreeMap<NamespaceName, Value>, CoreError> {
    if !root.is_dir() {
        tracing::error!("invalid path: {}", root.display());
        return Err(CoreError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut entries: Vec<_> = std::fs::read_dir(root)
        .map_err(|e| io_err(root, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut namespaces = BTreeMap::new();
    for entry in entries {
        let marker_path = entry.path().join(marker);
        if !marker_path.is_file() {
            continue;
        }
        let Some(data) = parse_marker(&marker_path) else {
            tracing::warn!("parsing {} did not return anything", marker_path.display());
            continue;
        };
        match data.get("namespace").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => {
                tracing::debug!("found ns: {name} in {}", marker_path.display());
                namespaces.insert(NamespaceName::from(name), data);
            }
            _ => tracing::warn!("no ns found in {}", marker_path.display()),
        }
    }
    Ok(namespaces)
}

fn parse_marker(path: &Path) -> Option<Value> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("failed to read {}: {e}", path.display());
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&contents) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("failed to parse {}: {e}", path.display());
            None
        }
    }
}
