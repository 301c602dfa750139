//! JSON document files: read, atomic write, removal and best-effort listing.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;
use walkdir::WalkDir;

use super::paths::DOCUMENT_EXTENSION;
use crate::error::{Result, StoreError};

/// A document found while listing a directory, keyed by its file stem.
#[derive(Debug, Clone)]
pub struct ListedDocument {
    pub id: String,
    pub path: PathBuf,
    pub document: Value,
}

/// Read and parse a document. `Ok(None)` means the file does not exist.
pub fn read_document(path: &Path, kind: &'static str, id: &str) -> Result<Option<Value>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::storage(format!("reading {} '{}'", kind, id), e)),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::corrupt(kind, id, e))
}

/// Pretty-print `document` to `path`, creating parent directories.
///
/// The content goes to a sibling temp file first and is renamed over the
/// target, so readers see either the old or the new document.
pub fn write_document(path: &Path, document: &Value, kind: &'static str, id: &str) -> Result<()> {
    let action = || format!("writing {} '{}'", kind, id);
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::validation(format!("{} '{}' has no parent directory", kind, id)))?;
    fs::create_dir_all(parent).map_err(|e| StoreError::storage(action(), e))?;

    let mut content = serde_json::to_string_pretty(document)
        .map_err(|e| StoreError::corrupt(kind, id, e))?;
    content.push('\n');

    let tmp_file = parent.join(format!(".{}-{}.tmp", id, Uuid::new_v4()));
    fs::write(&tmp_file, content).map_err(|e| StoreError::storage(action(), e))?;
    if let Err(e) = fs::rename(&tmp_file, path) {
        let _ = fs::remove_file(&tmp_file);
        return Err(StoreError::storage(action(), e));
    }
    log::debug!("wrote {} '{}' to {}", kind, id, path.display());
    Ok(())
}

/// Remove a document. Returns `false` if it did not exist.
pub fn remove_document(path: &Path, kind: &'static str, id: &str) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("removed {} '{}' at {}", kind, id, path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::storage(format!("deleting {} '{}'", kind, id), e)),
    }
}

pub fn document_exists(path: &Path, kind: &'static str, id: &str) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::storage(format!("checking {} '{}'", kind, id), e)),
    }
}

/// Parse every `.json` file under `dir`, sorted by id.
///
/// Files that cannot be read or parsed are logged and skipped; only a
/// failure to read `dir` itself is an error. A missing `dir` is empty.
pub fn list_documents(dir: &Path, kind: &'static str, recursive: bool) -> Result<Vec<ListedDocument>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };

    let mut documents = Vec::new();
    for entry in walker.sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(StoreError::storage(
                    format!("listing {} documents", kind),
                    std::io::Error::from(e),
                ))
            }
            Err(e) => {
                log::warn!("skipping unreadable {} entry: {}", kind, e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION)
        {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if id.starts_with('.') {
            continue;
        }
        match read_document(path, kind, id) {
            Ok(Some(document)) => documents.push(ListedDocument {
                id: id.to_string(),
                path: path.to_path_buf(),
                document,
            }),
            Ok(None) => {}
            Err(e) => log::warn!("skipping {} file {:?}: {}", kind, entry.file_name(), e),
        }
    }
    documents.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/goblin.json");
        let doc = json!({"basics": {"name": "Goblin"}, "AC": 15});
        write_document(&path, &doc, "monster", "goblin").unwrap();
        assert_eq!(read_document(&path, "monster", "goblin").unwrap(), Some(doc));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"AC\": 15"), "pretty printed: {raw}");
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orc.json");
        write_document(&path, &json!({"v": 1}), "monster", "orc").unwrap();
        write_document(&path, &json!({"v": 2}), "monster", "orc").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["orc.json".to_string()]);
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nobody.json");
        assert_eq!(read_document(&path, "monster", "nobody").unwrap(), None);
        assert!(!remove_document(&path, "monster", "nobody").unwrap());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_document(&path, "encounter", "broken").unwrap_err();
        assert!(matches!(err, StoreError::CorruptDocument { .. }));
    }

    #[test]
    fn listing_skips_malformed_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.json"), r#"{"name": "Good"}"#).unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join(".good-123.tmp"), "{}").unwrap();

        let listed = list_documents(dir.path(), "encounter", false).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "good");
    }

    #[test]
    fn recursive_listing_descends() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/deep.json"), "{}").unwrap();
        fs::write(dir.path().join("top.json"), "{}").unwrap();

        let flat = list_documents(dir.path(), "monster", false).unwrap();
        assert_eq!(flat.len(), 1);
        let deep = list_documents(dir.path(), "monster", true).unwrap();
        let ids: Vec<_> = deep.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["deep", "top"]);
    }

    #[test]
    fn listing_a_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let listed = list_documents(&dir.path().join("absent"), "monster", true).unwrap();
        assert!(listed.is_empty());
    }
}
