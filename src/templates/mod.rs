//! Reusable statblock fragments (traits, attack rolls, saving throws, ...).
//!
//! A template's id is derived from its content when it is created and never
//! changes afterwards. Creating a template whose id is already taken is a
//! conflict, not an overwrite.

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;
use serde_json::Value;

mod endpoints;

pub use endpoints::*;

use crate::error::{Result, StoreError};
use crate::store::documents;
use crate::store::ids::{derive_id, is_canonical_template_id, IdTarget};
use crate::store::{Collection, ContentStore, TemplateType};

const KIND: &str = "template";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
}

pub struct TemplateRepository<'a> {
    store: &'a ContentStore,
    template_type: TemplateType,
}

impl<'a> TemplateRepository<'a> {
    pub fn new(store: &'a ContentStore, template_type: TemplateType) -> Self {
        TemplateRepository {
            store,
            template_type,
        }
    }

    fn collection(&self) -> Collection {
        Collection::Templates(self.template_type)
    }

    fn lock_key(&self, id: &str) -> String {
        format!("templates/{}/{}", self.template_type, id)
    }

    fn checked_path(&self, id: &str) -> Result<std::path::PathBuf> {
        if !is_canonical_template_id(id) {
            return Err(StoreError::validation(format!(
                "template id '{}' must be lowercase alphanumerics separated by single underscores",
                id
            )));
        }
        self.store.resolve(self.collection(), id)
    }

    pub fn list(&self) -> Result<Vec<TemplateSummary>> {
        let dir = self.store.collection_dir(self.collection());
        let listed = documents::list_documents(&dir, KIND, false)?;
        Ok(listed
            .into_iter()
            .filter_map(|doc| match doc.document.get("name").and_then(Value::as_str) {
                Some(name) => Some(TemplateSummary {
                    name: name.to_string(),
                    id: doc.id,
                }),
                None => {
                    log::warn!(
                        "skipping {} template '{}': missing name",
                        self.template_type,
                        doc.id
                    );
                    None
                }
            })
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Value> {
        let path = self.checked_path(id)?;
        documents::read_document(&path, KIND, id)?.ok_or_else(|| StoreError::not_found(KIND, id))
    }

    /// Store a new template under its derived id. Any client-supplied `id` is
    /// replaced.
    pub fn create(&self, mut payload: Value) -> Result<Value> {
        let id = derive_id(
            IdTarget::Template(self.template_type),
            &payload,
            self.store.template_id_policy(),
        )?;
        let object = payload
            .as_object_mut()
            .ok_or_else(|| StoreError::MalformedBody("expected a JSON object".to_string()))?;
        object.insert("id".to_string(), Value::String(id.clone()));
        let path = self.checked_path(&id)?;

        self.store.write_locks().with_lock(&self.lock_key(&id), || {
            if documents::document_exists(&path, KIND, &id)? {
                log::info!("rejected duplicate {} template '{}'", self.template_type, id);
                return Err(StoreError::Conflict { kind: KIND, id: id.clone() });
            }
            documents::write_document(&path, &payload, KIND, &id)?;
            Ok(payload)
        })
    }

    /// Replace an existing template. The id stays the one it was created with.
    pub fn update(&self, id: &str, mut payload: Value) -> Result<Value> {
        let path = self.checked_path(id)?;
        let object = payload
            .as_object_mut()
            .ok_or_else(|| StoreError::MalformedBody("expected a JSON object".to_string()))?;
        let has_name = object
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.trim().is_empty());
        if !has_name {
            return Err(StoreError::validation(
                "field 'name' is required and must be a non-empty string",
            ));
        }
        object.insert("id".to_string(), Value::String(id.to_string()));

        self.store.write_locks().with_lock(&self.lock_key(id), || {
            if !documents::document_exists(&path, KIND, id)? {
                return Err(StoreError::not_found(KIND, id));
            }
            documents::write_document(&path, &payload, KIND, id)?;
            Ok(payload)
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.checked_path(id)?;
        self.store.write_locks().with_lock(&self.lock_key(id), || {
            if documents::remove_document(&path, KIND, id)? {
                Ok(())
            } else {
                Err(StoreError::not_found(KIND, id))
            }
        })
    }
}
