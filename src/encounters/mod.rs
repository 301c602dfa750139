//! Encounters: named groups of monsters enriched with combat statistics.
//!
//! A save resolves every referenced monster first and writes a single file
//! only when all of them resolved, so a failed save leaves nothing behind.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use serde_json::{json, Value};

pub mod difficulty;
mod endpoints;
pub mod enrichment;

pub use endpoints::*;

use crate::error::{Result, StoreError};
use crate::monsters::SaveOutcome;
use crate::store::documents;
use crate::store::ids::{derive_id, IdTarget};
use crate::store::{paths, Collection, ContentStore};
use difficulty::{assess, Party};
use enrichment::{enrich, parse_monster_refs};

const KIND: &str = "encounter";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct EncounterSummary {
    pub id: String,
    pub name: String,
    pub calculated_difficulty: Option<String>,
}

pub struct EncounterRepository<'a> {
    store: &'a ContentStore,
}

impl<'a> EncounterRepository<'a> {
    pub fn new(store: &'a ContentStore) -> Self {
        EncounterRepository { store }
    }

    pub fn list(&self) -> Result<Vec<EncounterSummary>> {
        let dir = self.store.collection_dir(Collection::Encounters);
        let listed = documents::list_documents(&dir, KIND, false)?;
        Ok(listed
            .into_iter()
            .filter_map(|doc| {
                let Some(name) = doc.document.get("name").and_then(Value::as_str) else {
                    log::warn!("skipping encounter '{}': missing name", doc.id);
                    return None;
                };
                Some(EncounterSummary {
                    name: name.to_string(),
                    calculated_difficulty: doc
                        .document
                        .get("calculatedDifficulty")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    id: doc.id,
                })
            })
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Value> {
        let path = self.store.resolve(Collection::Encounters, id)?;
        documents::read_document(&path, KIND, id)?.ok_or_else(|| StoreError::not_found(KIND, id))
    }

    /// Enrich and store an encounter. Without an explicit `id` one is derived
    /// from the encounter's name.
    pub fn save(&self, id: Option<&str>, payload: Value) -> Result<SaveOutcome> {
        let id = match id {
            Some(id) => paths::validate_id(id)?.to_string(),
            None => derive_id(IdTarget::Encounter, &payload, self.store.template_id_policy())?,
        };
        let document = self.build_document(&id, payload)?;
        let path = self.store.resolve(Collection::Encounters, &id)?;

        self.store
            .write_locks()
            .with_lock(&format!("encounters/{}", id), || {
                let existed = documents::document_exists(&path, KIND, &id)?;
                documents::write_document(&path, &document, KIND, &id)?;
                Ok(SaveOutcome {
                    document,
                    created: !existed,
                })
            })
    }

    /// Validate the payload and compute every derived field.
    pub fn build_document(&self, id: &str, payload: Value) -> Result<Value> {
        if !payload.is_object() {
            return Err(StoreError::MalformedBody("expected a JSON object".to_string()));
        }
        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StoreError::validation("field 'name' is required and must be a non-empty string"))?
            .to_string();
        let description = match payload.get("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(_) => return Err(StoreError::validation("field 'description' must be a string")),
        };
        let party = match payload.get("party") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                serde_json::from_value::<Party>(raw.clone()).map_err(|e| {
                    StoreError::validation(format!("field 'party' is invalid: {}", e))
                })?,
            ),
        };

        let refs = parse_monster_refs(&payload)?;
        let monsters = enrich(&refs, &self.store.monsters())?;
        let report = assess(&monsters, party.as_ref());

        let Value::Object(mut document) = payload else {
            return Err(StoreError::MalformedBody("expected a JSON object".to_string()));
        };
        document.insert("id".to_string(), json!(id));
        document.insert("name".to_string(), json!(name));
        document.insert("description".to_string(), json!(description));
        document.insert("party".to_string(), json!(party));
        document.insert("calculatedDifficulty".to_string(), json!(report.difficulty));
        document.insert("totalXp".to_string(), json!(report.total_xp));
        document.insert("adjustedXp".to_string(), json!(report.adjusted_xp));
        document.insert("monsters".to_string(), json!(monsters));
        Ok(Value::Object(document))
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.store.resolve(Collection::Encounters, id)?;
        self.store
            .write_locks()
            .with_lock(&format!("encounters/{}", id), || {
                if documents::remove_document(&path, KIND, id)? {
                    Ok(())
                } else {
                    Err(StoreError::not_found(KIND, id))
                }
            })
    }
}
