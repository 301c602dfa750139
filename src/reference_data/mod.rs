//! Static reference data (`spells.json`, `skills.json`, ...) served through
//! the read-through cache. The files are treated as immutable while the
//! process runs.

use std::fs;

mod endpoints;

pub use endpoints::*;

use crate::error::{Result, StoreError};
use crate::store::cache::CachedDocument;
use crate::store::paths::{self, DOCUMENT_EXTENSION};
use crate::store::{documents, Collection, ContentStore};

const KIND: &str = "reference data";

pub struct ReferenceDataRepository<'a> {
    store: &'a ContentStore,
}

impl<'a> ReferenceDataRepository<'a> {
    pub fn new(store: &'a ContentStore) -> Self {
        ReferenceDataRepository { store }
    }

    /// Sorted `.json` filenames in the reference-data directory.
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = self.store.collection_dir(Collection::ReferenceData);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::storage("listing reference data", e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::storage("listing reference data", e))?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION)
            {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Serve `filename` from the cache, loading it from disk on a miss.
    pub fn get(&self, filename: &str) -> Result<CachedDocument> {
        let stem = paths::reference_stem(filename)?;
        let path = self.store.resolve(Collection::ReferenceData, stem)?;
        self.store.reference_cache().get_or_load(filename, || {
            documents::read_document(&path, KIND, filename)?
                .ok_or_else(|| StoreError::not_found(KIND, filename))
        })
    }
}
