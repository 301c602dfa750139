//! Mapping of `(collection, id)` pairs to files inside the store root.

use std::path::{Component, Path, PathBuf};

use super::Collection;
use crate::error::{Result, StoreError};

pub const DOCUMENT_EXTENSION: &str = "json";

/// Check that `raw` can name a single file inside a collection directory.
pub fn validate_id(raw: &str) -> Result<&str> {
    if raw.trim().is_empty() {
        return Err(StoreError::validation("identifier must not be empty"));
    }
    if raw.contains("..") || raw.contains('/') || raw.contains('\\') {
        return Err(StoreError::validation(format!(
            "identifier '{}' contains a path separator or '..'",
            raw
        )));
    }
    // Leading dots would hide the file from listings and collide with temp files.
    if raw.starts_with('.') || raw.contains('\0') {
        return Err(StoreError::validation(format!(
            "identifier '{}' contains forbidden characters",
            raw
        )));
    }
    Ok(raw)
}

/// Resolve `<base>/<collection dir>/<raw_id>.json` to an absolute path that is
/// guaranteed to stay inside `base`.
pub fn resolve(base: &Path, collection: Collection, raw_id: &str) -> Result<PathBuf> {
    let id = validate_id(raw_id)?;
    let root = absolutize(base)?;
    let candidate = normalize(
        &root
            .join(collection.relative_dir())
            .join(format!("{}.{}", id, DOCUMENT_EXTENSION)),
    );
    if !candidate.starts_with(&root) {
        log::warn!(
            "rejected {} identifier '{}' escaping the store root",
            collection.kind_name(),
            id
        );
        return Err(StoreError::validation(format!(
            "identifier '{}' escapes the store",
            id
        )));
    }
    Ok(candidate)
}

/// Split a reference-data filename such as `spells.json` into its stem.
pub fn reference_stem(filename: &str) -> Result<&str> {
    let stem = filename
        .strip_suffix(".json")
        .ok_or_else(|| StoreError::validation(format!("'{}' is not a .json file", filename)))?;
    validate_id(stem)
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| StoreError::storage("resolving the working directory", e))?;
    Ok(normalize(&cwd.join(path)))
}
