//! Monster statblocks, split into `completed` and `uncompleted` collections.
//!
//! Lookups always search `completed` first, then `uncompleted`. A save moves
//! the record into the collection matching its `complete` flag: the new file
//! is written before the old one is removed, so a crash in between leaves the
//! record present in both rather than in neither.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use serde_json::Value;

mod endpoints;

pub use endpoints::*;

use crate::encounters::enrichment::{parse_cr, MonsterResolver};
use crate::error::{Result, StoreError};
use crate::store::documents::{self, ListedDocument};
use crate::store::{paths, Collection, Completeness, ContentStore};

const KIND: &str = "monster";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct MonsterSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "CR")]
    pub cr: Option<f64>,
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub monster_type: Option<String>,
    pub complete: bool,
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub document: Value,
    pub created: bool,
}

pub struct MonsterRepository<'a> {
    store: &'a ContentStore,
}

impl<'a> MonsterRepository<'a> {
    pub fn new(store: &'a ContentStore) -> Self {
        MonsterRepository { store }
    }

    fn lock_key(id: &str) -> String {
        format!("monsters/{}", id)
    }

    pub fn list(&self) -> Result<Vec<MonsterSummary>> {
        let root = self.store.root().join("monsters");
        let completed_dir = self
            .store
            .collection_dir(Collection::Monsters(Completeness::Completed));
        let listed = documents::list_documents(&root, KIND, true)?;
        Ok(listed
            .iter()
            .filter_map(|doc| {
                let summary = summarize(doc, doc.path.starts_with(&completed_dir));
                if summary.is_none() {
                    log::warn!("skipping monster '{}': missing basics.name", doc.id);
                }
                summary
            })
            .collect())
    }

    /// Find a monster and the collection holding it.
    pub fn locate(&self, id: &str) -> Result<Option<(Completeness, Value)>> {
        for completeness in Completeness::SEARCH_ORDER {
            let path = self.store.resolve(Collection::Monsters(completeness), id)?;
            if let Some(document) = documents::read_document(&path, KIND, id)? {
                return Ok(Some((completeness, document)));
            }
        }
        Ok(None)
    }

    pub fn get(&self, id: &str) -> Result<Value> {
        self.locate(id)?
            .map(|(_, document)| document)
            .ok_or_else(|| StoreError::not_found(KIND, id))
    }

    /// Create or replace a monster, relocating it according to `complete`.
    pub fn save(&self, id: &str, mut document: Value) -> Result<SaveOutcome> {
        paths::validate_id(id)?;
        let object = document
            .as_object_mut()
            .ok_or_else(|| StoreError::MalformedBody("expected a JSON object".to_string()))?;
        let has_name = object
            .get("basics")
            .and_then(|basics| basics.get("name"))
            .and_then(Value::as_str)
            .is_some_and(|name| !name.trim().is_empty());
        if !has_name {
            return Err(StoreError::validation(
                "field 'basics.name' is required and must be a non-empty string",
            ));
        }
        let complete = match object.get("complete") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(StoreError::validation("field 'complete' must be a boolean")),
        };
        object.insert("id".to_string(), Value::String(id.to_string()));

        let target = Completeness::from_flag(complete);
        let target_path = self.store.resolve(Collection::Monsters(target), id)?;
        let other_path = self.store.resolve(Collection::Monsters(target.other()), id)?;

        self.store.write_locks().with_lock(&Self::lock_key(id), || {
            let existed_here = documents::document_exists(&target_path, KIND, id)?;
            let existed_there = documents::document_exists(&other_path, KIND, id)?;

            documents::write_document(&target_path, &document, KIND, id)?;
            if existed_there {
                documents::remove_document(&other_path, KIND, id)?;
                log::debug!("moved monster '{}' to {}", id, target.dir_name());
            }

            Ok(SaveOutcome {
                created: !existed_here && !existed_there,
                document,
            })
        })
    }

    /// Remove the monster from both collections.
    pub fn delete(&self, id: &str) -> Result<()> {
        let completed = self
            .store
            .resolve(Collection::Monsters(Completeness::Completed), id)?;
        let uncompleted = self
            .store
            .resolve(Collection::Monsters(Completeness::Uncompleted), id)?;

        self.store.write_locks().with_lock(&Self::lock_key(id), || {
            let removed_completed = documents::remove_document(&completed, KIND, id)?;
            let removed_uncompleted = documents::remove_document(&uncompleted, KIND, id)?;
            if removed_completed || removed_uncompleted {
                Ok(())
            } else {
                Err(StoreError::not_found(KIND, id))
            }
        })
    }
}

impl MonsterResolver for MonsterRepository<'_> {
    fn resolve_monster(&self, monster_id: &str) -> Result<Value> {
        self.get(monster_id)
    }
}

fn summarize(listed: &ListedDocument, complete: bool) -> Option<MonsterSummary> {
    let basics = listed.document.get("basics")?;
    let name = basics.get("name")?.as_str()?;
    let text = |field: &str| basics.get(field).and_then(Value::as_str).map(str::to_string);
    Some(MonsterSummary {
        id: listed.id.clone(),
        name: name.to_string(),
        cr: basics.get("CR").and_then(parse_cr),
        size: text("size"),
        monster_type: text("type"),
        complete,
    })
}
