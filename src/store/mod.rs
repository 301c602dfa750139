//! The file-backed content store.
//!
//! Documents live under one root directory:
//!
//! ```text
//! <root>/monsters/completed/<id>.json
//! <root>/monsters/uncompleted/<id>.json
//! <root>/encounters/<id>.json
//! <root>/templates/<type>/<id>.json
//! <root>/dnddata/<file>.json
//! ```
//!
//! [`ContentStore`] owns the root, the per-id write locks and the reference
//! data cache. Resource repositories borrow it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod cache;
pub mod documents;
pub mod ids;
pub mod locks;
pub mod paths;

use crate::config::StoreConfig;
use crate::encounters::EncounterRepository;
use crate::error::{Result, StoreError};
use crate::monsters::MonsterRepository;
use crate::reference_data::ReferenceDataRepository;
use crate::templates::TemplateRepository;
use cache::ReferenceCache;
use ids::TemplateIdPolicy;
use locks::KeyedLocks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Completeness {
    Completed,
    Uncompleted,
}

impl Completeness {
    pub fn from_flag(complete: bool) -> Self {
        if complete {
            Completeness::Completed
        } else {
            Completeness::Uncompleted
        }
    }

    pub fn other(self) -> Self {
        match self {
            Completeness::Completed => Completeness::Uncompleted,
            Completeness::Uncompleted => Completeness::Completed,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Completeness::Completed => "completed",
            Completeness::Uncompleted => "uncompleted",
        }
    }

    /// Lookup order used everywhere a monster is searched for.
    pub const SEARCH_ORDER: [Completeness; 2] = [Completeness::Completed, Completeness::Uncompleted];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateType {
    Trait,
    AttackRoll,
    SavingThrow,
    Other,
}

impl TemplateType {
    pub const ALL: [TemplateType; 4] = [
        TemplateType::Trait,
        TemplateType::AttackRoll,
        TemplateType::SavingThrow,
        TemplateType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateType::Trait => "trait",
            TemplateType::AttackRoll => "attackRoll",
            TemplateType::SavingThrow => "savingThrow",
            TemplateType::Other => "other",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        TemplateType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                StoreError::validation(format!(
                    "unknown template type '{}', expected one of trait, attackRoll, savingThrow, other",
                    s
                ))
            })
    }
}

/// A storage partition: a resource kind plus its sub-collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Monsters(Completeness),
    Encounters,
    Templates(TemplateType),
    ReferenceData,
}

impl Collection {
    pub fn relative_dir(self) -> PathBuf {
        match self {
            Collection::Monsters(completeness) => {
                Path::new("monsters").join(completeness.dir_name())
            }
            Collection::Encounters => PathBuf::from("encounters"),
            Collection::Templates(template_type) => {
                Path::new("templates").join(template_type.as_str())
            }
            Collection::ReferenceData => PathBuf::from("dnddata"),
        }
    }

    pub fn kind_name(self) -> &'static str {
        match self {
            Collection::Monsters(_) => "monster",
            Collection::Encounters => "encounter",
            Collection::Templates(_) => "template",
            Collection::ReferenceData => "reference data",
        }
    }

    pub fn all() -> Vec<Collection> {
        let mut all = vec![
            Collection::Monsters(Completeness::Completed),
            Collection::Monsters(Completeness::Uncompleted),
            Collection::Encounters,
            Collection::ReferenceData,
        ];
        all.extend(TemplateType::ALL.into_iter().map(Collection::Templates));
        all
    }
}

#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
    template_ids: TemplateIdPolicy,
    write_locks: KeyedLocks,
    reference_cache: ReferenceCache,
}

impl ContentStore {
    /// Open the store at the configured root, creating every collection
    /// directory. Failing here means the store is unusable.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let root = paths::absolutize(&config.store_root)?;
        for collection in Collection::all() {
            let dir = root.join(collection.relative_dir());
            std::fs::create_dir_all(&dir).map_err(|e| {
                StoreError::storage(format!("creating the {} directory", collection.kind_name()), e)
            })?;
        }
        log::info!("content store opened at {}", root.display());
        Ok(ContentStore {
            root,
            template_ids: config.template_ids.clone(),
            write_locks: KeyedLocks::new(),
            reference_cache: ReferenceCache::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, collection: Collection, id: &str) -> Result<PathBuf> {
        paths::resolve(&self.root, collection, id)
    }

    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.relative_dir())
    }

    pub fn template_id_policy(&self) -> &TemplateIdPolicy {
        &self.template_ids
    }

    pub(crate) fn write_locks(&self) -> &KeyedLocks {
        &self.write_locks
    }

    pub fn reference_cache(&self) -> &ReferenceCache {
        &self.reference_cache
    }

    pub fn monsters(&self) -> MonsterRepository<'_> {
        MonsterRepository::new(self)
    }

    pub fn encounters(&self) -> EncounterRepository<'_> {
        EncounterRepository::new(self)
    }

    pub fn templates(&self, template_type: TemplateType) -> TemplateRepository<'_> {
        TemplateRepository::new(self, template_type)
    }

    pub fn reference_data(&self) -> ReferenceDataRepository<'_> {
        ReferenceDataRepository::new(self)
    }
}

/// Parse a request body into a JSON object.
pub fn parse_body(body: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| StoreError::MalformedBody(e.to_string()))?;
    if !value.is_object() {
        return Err(StoreError::MalformedBody(
            "expected a JSON object".to_string(),
        ));
    }
    Ok(value)
}
